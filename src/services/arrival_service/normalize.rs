use chrono::{DateTime, Utc};
use tracing::debug;

use super::{
    destinations::{destination_label, DestinationLookup},
    types::bus_arrival_response::{BusArrivalService, NextBus},
};
use crate::types::arrival_estimate::{ArrivalEstimate, Occupancy, VehicleType, ETA_SLOTS};

/// Whole minutes from `now` until `estimated_arrival`, floored. A bus that is already due reads
/// as 0. Missing or unparseable timestamps give `None`.
pub fn eta_minutes(estimated_arrival: &str, now: DateTime<Utc>) -> Option<i64> {
    let raw = estimated_arrival.trim();
    if raw.is_empty() {
        return None;
    }

    let arrival = match DateTime::parse_from_rfc3339(raw) {
        Ok(arrival) => arrival,
        Err(e) => {
            debug!(timestamp = raw, error = %e, "Ignoring unparseable arrival time");
            return None;
        }
    };

    let seconds = arrival.signed_duration_since(now).num_seconds();
    Some(seconds.div_euclid(60).max(0))
}

/// Converts one upstream service record. Returns `None` when none of its three buses has a
/// prediction.
pub async fn normalize_service(
    service: &BusArrivalService,
    now: DateTime<Utc>,
    destinations: &dyn DestinationLookup,
) -> Option<ArrivalEstimate> {
    let buses: [Option<&NextBus>; ETA_SLOTS] = [
        service.NextBus.as_ref(),
        service.NextBus2.as_ref(),
        service.NextBus3.as_ref(),
    ];
    let eta_minutes = buses.map(|bus| bus.and_then(|b| eta_minutes(&b.EstimatedArrival, now)));

    // The earliest predicted bus describes the service.
    let lead = buses
        .iter()
        .zip(eta_minutes.iter())
        .find_map(|(bus, eta)| eta.and(*bus))?;

    Some(ArrivalEstimate {
        service_number: service.ServiceNo.trim().to_string(),
        operator: service.Operator.trim().to_string(),
        destination_label: destination_label(destinations, lead.DestinationCode.trim()).await,
        eta_minutes,
        occupancy: Occupancy::from_code(&lead.Load),
        vehicle_type: VehicleType::from_code(&lead.Type),
        wheelchair_accessible: lead.Feature.trim() == "WAB",
    })
}

pub async fn normalize_services(
    services: &[BusArrivalService],
    now: DateTime<Utc>,
    destinations: &dyn DestinationLookup,
) -> Vec<ArrivalEstimate> {
    let mut estimates = Vec::with_capacity(services.len());
    for service in services {
        match normalize_service(service, now, destinations).await {
            Some(estimate) => estimates.push(estimate),
            None => debug!(service = %service.ServiceNo, "Dropping service without predictions"),
        }
    }
    estimates
}
