use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use serde::Deserialize;
use tracing::warn;

use crate::types::{
    stop::{RankedStop, Stop},
    user_location::{Coordinate, UserLocation},
};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Distance,
    Name,
}

/// Great-circle distance between two coordinates, in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for near-antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

pub fn distance_label(km: f64) -> String {
    let meters = (km * 1000.0).round();
    if meters < 1000.0 {
        format!("{} m", meters as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// Attaches distances from `origin` to every stop, keeping catalog order.
pub fn rank(stops: &[Stop], origin: &UserLocation) -> Vec<RankedStop> {
    let origin = origin.coordinate();

    stops
        .iter()
        .map(|stop| {
            let km = haversine_km(origin, Coordinate::new(stop.latitude, stop.longitude));
            RankedStop {
                stop: stop.clone(),
                distance_meters: (km * 1000.0).max(0.0),
                distance_label: distance_label(km),
            }
        })
        .collect()
}

/// Orders display names with root-locale Unicode collation: accents and case are secondary to
/// the base letters, lowercase sorts before uppercase and punctuation before digits. Names the
/// collator considers equal fall back to raw string order so the order is total.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        match Collator::try_new(&Default::default(), CollatorOptions::new()) {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(e) => {
                warn!(error = ?e, "Collation data unavailable, sorting names case-folded");
                Self { collator: None }
            }
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable sort, so equal keys keep their catalog order.
pub fn sort_stops(stops: &mut [RankedStop], mode: SortMode) {
    match mode {
        SortMode::Distance => {
            stops.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters))
        }
        SortMode::Name => {
            let collator = NameCollator::new();
            stops.sort_by(|a, b| collator.compare(&a.stop.name, &b.stop.name))
        }
    }
}

pub fn matches_query(stop: &Stop, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [&stop.name, &stop.code, &stop.road]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_stops(stops: Vec<RankedStop>, query: &str) -> Vec<RankedStop> {
    if query.trim().is_empty() {
        return stops;
    }

    stops
        .into_iter()
        .filter(|ranked| matches_query(&ranked.stop, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(code: &str, name: &str, road: &str, latitude: f64, longitude: f64) -> Stop {
        Stop {
            code: code.to_string(),
            name: name.to_string(),
            road: road.to_string(),
            latitude,
            longitude,
        }
    }

    fn at(latitude: f64, longitude: f64) -> UserLocation {
        UserLocation {
            latitude,
            longitude,
            is_fallback: false,
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (Coordinate::new(1.30, 103.80), Coordinate::new(1.35, 103.85)),
            (Coordinate::new(-33.86, 151.21), Coordinate::new(51.50, -0.12)),
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0)),
        ];

        for (a, b) in pairs {
            assert_eq!(haversine_km(a, b), haversine_km(b, a));
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = Coordinate::new(1.2966, 103.8525);
        assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn known_distance() {
        // One degree of latitude is about 111.19 km on a 6371 km sphere.
        let km = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((km - 111.19).abs() < 0.01, "got {}", km);
    }

    #[test]
    fn labels() {
        assert_eq!(distance_label(0.0), "0 m");
        assert_eq!(distance_label(0.2504), "250 m");
        assert_eq!(distance_label(0.9994), "999 m");
        // Rounds up to a full kilometer.
        assert_eq!(distance_label(0.9996), "1.0 km");
        assert_eq!(distance_label(1.0), "1.0 km");
        assert_eq!(distance_label(1.26), "1.3 km");
        assert_eq!(distance_label(12.04), "12.0 km");
    }

    #[test]
    fn ranks_nearest_first() {
        let stops = vec![
            stop("B", "Beta", "Road B", 1.35, 103.85),
            stop("A", "Alpha", "Road A", 1.30, 103.80),
        ];

        let mut ranked = rank(&stops, &at(1.30, 103.80));
        sort_stops(&mut ranked, SortMode::Distance);

        let codes: Vec<_> = ranked.iter().map(|r| r.stop.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert!(ranked[0].distance_meters < 1e-6);
        assert_eq!(ranked[0].distance_label, "0 m");
        assert!(ranked[1].distance_meters > ranked[0].distance_meters);
        assert!(ranked.iter().all(|r| r.distance_meters >= 0.0));
    }

    #[test]
    fn distance_sort_is_consistent_and_stable() {
        let stops = vec![
            stop("1", "Far", "", 1.40, 103.90),
            stop("2", "Twin One", "", 1.31, 103.81),
            stop("3", "Near", "", 1.30, 103.80),
            stop("4", "Twin Two", "", 1.31, 103.81),
        ];

        let mut ranked = rank(&stops, &at(1.30, 103.80));
        sort_stops(&mut ranked, SortMode::Distance);

        assert!(ranked
            .windows(2)
            .all(|w| w[0].distance_meters <= w[1].distance_meters));
        let codes: Vec<_> = ranked.iter().map(|r| r.stop.code.as_str()).collect();
        assert_eq!(codes, vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn name_sort_ignores_case_and_is_stable() {
        let stops = vec![
            stop("1", "opp Blk 10", "", 1.30, 103.80),
            stop("2", "Bef Jln Besar", "", 1.30, 103.80),
            stop("3", "Aft Lor 1", "", 1.30, 103.80),
            stop("4", "Bef Jln Besar", "", 1.31, 103.81),
        ];

        let mut ranked = rank(&stops, &at(1.30, 103.80));
        sort_stops(&mut ranked, SortMode::Name);

        let codes: Vec<_> = ranked.iter().map(|r| r.stop.code.as_str()).collect();
        assert_eq!(codes, vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn names_collate_like_a_locale() {
        let collator = NameCollator::new();

        assert_eq!(collator.compare("bef jln", "Bef Jln"), Ordering::Less);
        assert_eq!(collator.compare("École", "Zed"), Ordering::Less);
        assert_eq!(collator.compare("Ecole", "École"), Ordering::Less);
        assert_eq!(collator.compare("Stop: A", "Stop1"), Ordering::Less);
        assert_eq!(collator.compare("Blk 2", "Blk 2"), Ordering::Equal);
    }

    #[test]
    fn name_sort_places_accents_with_base_letters() {
        let stops = vec![
            stop("1", "Zion Rd", "", 1.30, 103.80),
            stop("2", "École Internationale", "", 1.30, 103.80),
            stop("3", "Eunos Stn", "", 1.30, 103.80),
        ];

        let mut ranked = rank(&stops, &at(1.30, 103.80));
        sort_stops(&mut ranked, SortMode::Name);

        let codes: Vec<_> = ranked.iter().map(|r| r.stop.code.as_str()).collect();
        assert_eq!(codes, vec!["2", "3", "1"]);
    }

    #[test]
    fn filter_matches_name_code_and_road() {
        let stops = vec![
            stop("01012", "Hotel Grand Pacific", "Victoria St", 1.2968, 103.8525),
            stop("01013", "St. Joseph's Ch", "Victoria St", 1.2977, 103.8533),
            stop("83139", "Blk 102", "Jln Eunos", 1.3205, 103.9020),
        ];
        let ranked = rank(&stops, &at(1.30, 103.85));

        let by_name = filter_stops(ranked.clone(), "grand");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].stop.code, "01012");

        let by_code = filter_stops(ranked.clone(), "8313");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].stop.code, "83139");

        // Substring, not prefix.
        let by_road = filter_stops(ranked.clone(), "TORIA");
        assert_eq!(by_road.len(), 2);

        assert_eq!(filter_stops(ranked.clone(), "").len(), 3);
        assert_eq!(filter_stops(ranked, "   ").len(), 3);
    }

    #[test]
    fn filter_is_idempotent() {
        let stops = vec![
            stop("01012", "Hotel Grand Pacific", "Victoria St", 1.2968, 103.8525),
            stop("01013", "St. Joseph's Ch", "Victoria St", 1.2977, 103.8533),
            stop("83139", "Blk 102", "Jln Eunos", 1.3205, 103.9020),
        ];
        let ranked = rank(&stops, &at(1.30, 103.85));

        for query in ["st", "jln", "0101", "nothing"] {
            let once = filter_stops(ranked.clone(), query);
            let twice = filter_stops(once.clone(), query);
            assert_eq!(once, twice);
        }
    }
}
