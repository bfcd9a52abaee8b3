use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    destinations::DestinationLookup,
    normalize::normalize_services,
    types::{arrival_error::ArrivalError, bus_arrival_response::BusArrivalResponse},
};
use crate::types::arrival_estimate::ArrivalEstimate;

#[derive(Clone, Debug)]
pub struct ArrivalServiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Result of a successful lookup. `NoService` means the stop answered but no bus has a
/// prediction right now.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "arrivals", rename_all = "snake_case")]
pub enum ArrivalOutcome {
    Arrivals(Vec<ArrivalEstimate>),
    NoService,
}

impl ArrivalOutcome {
    pub fn from_estimates(estimates: Vec<ArrivalEstimate>) -> Self {
        if estimates.is_empty() {
            ArrivalOutcome::NoService
        } else {
            ArrivalOutcome::Arrivals(estimates)
        }
    }
}

#[async_trait]
pub trait ArrivalSource: Send + Sync {
    async fn fetch_arrivals(&self, stop_code: &str) -> Result<ArrivalOutcome, ArrivalError>;
}

#[derive(Clone)]
pub struct ArrivalService {
    config: ArrivalServiceConfig,
    client: reqwest::Client,
    destinations: Arc<dyn DestinationLookup>,
}

impl ArrivalService {
    pub fn new(config: ArrivalServiceConfig, destinations: Arc<dyn DestinationLookup>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            config,
            client,
            destinations,
        }
    }

    fn credential(&self) -> Result<&str, ArrivalError> {
        match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ArrivalError::CredentialMissing),
        }
    }

    async fn request(&self, stop_code: &str) -> Result<BusArrivalResponse, ArrivalError> {
        let key = self.credential()?;
        let url = format!("{}/BusArrival", self.config.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .get(&url)
            .query(&[("BusStopCode", stop_code)])
            .header("AccountKey", key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ArrivalError::NetworkFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArrivalError::UpstreamError(status.as_u16()));
        }

        resp.json::<BusArrivalResponse>()
            .await
            .map_err(|e| ArrivalError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ArrivalSource for ArrivalService {
    async fn fetch_arrivals(&self, stop_code: &str) -> Result<ArrivalOutcome, ArrivalError> {
        debug!(stop_code, "Fetching arrivals");
        let body = self.request(stop_code).await?;

        let estimates =
            normalize_services(&body.Services, Utc::now(), self.destinations.as_ref()).await;
        info!(
            stop_code,
            services = body.Services.len(),
            estimates = estimates.len(),
            "Fetched arrivals"
        );

        Ok(ArrivalOutcome::from_estimates(estimates))
    }
}
