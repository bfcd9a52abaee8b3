use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::types::user_location::{Coordinate, UserLocation};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out waiting for a location fix")]
    TimedOut,
}

/// Where the user's position comes from.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Position supplied by the client with its request. No coordinates means the device has no
/// position or refused to share it.
pub struct QueryLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[async_trait]
impl LocationSource for QueryLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Ok(Coordinate::new(lat, lon))
            }
            (None, None) => Err(LocationError::Unavailable(
                "no position supplied".to_string(),
            )),
            _ => Err(LocationError::Unavailable(
                "incomplete position supplied".to_string(),
            )),
        }
    }
}

/// One-shot position lookup. Never fails: a timeout or error resolves to `fallback`.
pub async fn locate(
    source: &dyn LocationSource,
    timeout: Duration,
    fallback: Coordinate,
) -> UserLocation {
    let result = match tokio::time::timeout(timeout, source.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::TimedOut),
    };

    match result {
        Ok(position) => {
            debug!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Located user"
            );
            UserLocation {
                latitude: position.latitude,
                longitude: position.longitude,
                is_fallback: false,
            }
        }
        Err(e) => {
            info!(reason = %e, "Using fallback location");
            UserLocation {
                latitude: fallback.latitude,
                longitude: fallback.longitude,
                is_fallback: true,
            }
        }
    }
}
