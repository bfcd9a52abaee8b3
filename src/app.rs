use std::{str::FromStr, sync::Arc, time::Duration};

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    routes::apply_routes,
    services::{
        arrival_board::{BoardTimings, LiveBoards},
        arrival_service::{
            arrival_service::{ArrivalService, ArrivalServiceConfig},
            destinations::{CatalogDestinations, DestinationLookup, StaticDestinations},
        },
        catalog_service::{CatalogSource, StopCatalog},
    },
    types::{app_state::AppState, user_location::Coordinate},
};

pub const DEFAULT_TRANSIT_API_HOST: &str = "https://datamall2.mytransport.sg/ltaodataservice/v3";
pub const DEFAULT_CATALOG: &str = "data/bus_stops.csv";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_FALLBACK: Coordinate = Coordinate {
    latitude: 1.3521,
    longitude: 103.8198,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationMode {
    /// Resolve destination codes against the stop catalog, then the static table.
    Catalog,
    Static,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub transit_api_key: Option<String>,
    pub transit_api_host: String,
    pub catalog_source: CatalogSource,
    pub fallback_location: Coordinate,
    pub bind_addr: String,
    pub destinations: DestinationMode,
    pub geolocation_timeout: Duration,
    pub request_timeout: Duration,
    pub board_timings: BoardTimings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transit_api_key: None,
            transit_api_host: DEFAULT_TRANSIT_API_HOST.to_string(),
            catalog_source: CatalogSource::parse(DEFAULT_CATALOG),
            fallback_location: DEFAULT_FALLBACK,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            destinations: DestinationMode::Catalog,
            geolocation_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            board_timings: BoardTimings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name,
                expected,
                value,
            }),
    }
}

fn parse_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match parse_var::<u64>(lookup, name, "a positive number of seconds")? {
        None => Ok(default),
        Some(0) => Err(ConfigError::InvalidValue {
            name,
            expected: "a positive number of seconds",
            value: "0".to_string(),
        }),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let fallback_latitude = parse_var::<f64>(&lookup, "FALLBACK_LAT", "a latitude")?
            .unwrap_or(defaults.fallback_location.latitude);
        let fallback_longitude = parse_var::<f64>(&lookup, "FALLBACK_LON", "a longitude")?
            .unwrap_or(defaults.fallback_location.longitude);
        if !(-90.0..=90.0).contains(&fallback_latitude) {
            return Err(ConfigError::InvalidValue {
                name: "FALLBACK_LAT",
                expected: "a latitude",
                value: fallback_latitude.to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&fallback_longitude) {
            return Err(ConfigError::InvalidValue {
                name: "FALLBACK_LON",
                expected: "a longitude",
                value: fallback_longitude.to_string(),
            });
        }

        let destinations = match lookup("DESTINATIONS").as_deref().map(str::trim) {
            None | Some("catalog") => DestinationMode::Catalog,
            Some("static") => DestinationMode::Static,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "DESTINATIONS",
                    expected: "\"catalog\" or \"static\"",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            transit_api_key: lookup("TRANSIT_API_KEY").filter(|k| !k.trim().is_empty()),
            transit_api_host: lookup("TRANSIT_API_BASE_URL").unwrap_or(defaults.transit_api_host),
            catalog_source: lookup("STOP_CATALOG")
                .map(|s| CatalogSource::parse(&s))
                .unwrap_or(defaults.catalog_source),
            fallback_location: Coordinate::new(fallback_latitude, fallback_longitude),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            destinations,
            geolocation_timeout: parse_seconds(
                &lookup,
                "GEOLOCATION_TIMEOUT_SECS",
                defaults.geolocation_timeout,
            )?,
            request_timeout: parse_seconds(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            )?,
            board_timings: BoardTimings {
                poll_interval: parse_seconds(
                    &lookup,
                    "POLL_INTERVAL_SECS",
                    defaults.board_timings.poll_interval,
                )?,
                ..defaults.board_timings
            },
        })
    }
}

pub fn gen_state(config: AppConfig) -> AppState {
    let catalog = StopCatalog::new(config.catalog_source.clone());

    let destinations: Arc<dyn DestinationLookup> = match config.destinations {
        DestinationMode::Catalog => Arc::new(CatalogDestinations::new(
            catalog.clone(),
            Arc::new(StaticDestinations::default()),
        )),
        DestinationMode::Static => Arc::new(StaticDestinations::default()),
    };

    let arrival_service = ArrivalService::new(
        ArrivalServiceConfig {
            api_key: config.transit_api_key.clone(),
            base_url: config.transit_api_host.clone(),
            timeout: config.request_timeout,
        },
        destinations,
    );

    let live_boards = LiveBoards::new(Arc::new(arrival_service.clone()), config.board_timings);

    AppState {
        config: Arc::new(config),
        catalog,
        arrival_service,
        live_boards,
    }
}

pub fn gen_router(state: AppState) -> Router {
    let cors_middleware = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    apply_routes(Router::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_middleware)
        .with_state(state)
}

#[cfg(test)]
pub const MOCK_CATALOG_CSV: &str = "\
BusStopCode,RoadName,Description,Latitude,Longitude
01012,Victoria St,Hotel Grand Pacific,1.29684825487647,103.85253591654006
01013,Victoria St,St. Joseph's Ch,1.29770970610083,103.8532247463225
83139,Jln Eunos,Blk 102,1.32056,103.90211
75009,Tampines Ctrl 1,Tampines Int,1.35406,103.94339
";

#[cfg(test)]
pub struct MockApp {
    pub app: Router,
    pub state: AppState,
    pub transit_server: mockito::ServerGuard,
    pub catalog_server: mockito::ServerGuard,
}

#[cfg(test)]
impl MockApp {
    pub async fn mock_catalog(&mut self, csv: &str) -> mockito::Mock {
        self.catalog_server
            .mock("GET", "/bus_stops.csv")
            .with_header("content-type", "text/csv")
            .with_body(csv)
            .create_async()
            .await
    }
}

#[cfg(test)]
pub async fn gen_mock_app_with(api_key: Option<&str>) -> MockApp {
    let api_key = api_key.map(str::to_string);
    gen_mock_app_configured(move |config| config.transit_api_key = api_key).await
}

/// Mock app whose config is adjusted after the mock servers are wired in.
#[cfg(test)]
pub async fn gen_mock_app_configured(adjust: impl FnOnce(&mut AppConfig)) -> MockApp {
    let transit_server = mockito::Server::new_async().await;
    let catalog_server = mockito::Server::new_async().await;

    let mut config = AppConfig {
        transit_api_key: Some("key".to_string()),
        transit_api_host: transit_server.url(),
        catalog_source: CatalogSource::Url(format!("{}/bus_stops.csv", catalog_server.url())),
        ..AppConfig::default()
    };
    adjust(&mut config);
    let state = gen_state(config);

    MockApp {
        app: gen_router(state.clone()),
        state,
        transit_server,
        catalog_server,
    }
}

#[cfg(test)]
pub async fn gen_mock_app() -> MockApp {
    gen_mock_app_with(Some("key")).await
}
