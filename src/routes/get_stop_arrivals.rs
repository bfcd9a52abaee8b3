use crate::{
    services::arrival_service::arrival_service::{ArrivalOutcome, ArrivalSource},
    types::{app_state::AppState, arrival_estimate::ArrivalEstimate, stop::Stop},
    utils::{app_error::AppError, slug::stop_href},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StopArrivalsStatus {
    Arrivals,
    /// The stop answered but no bus currently has a prediction.
    NoService,
}

#[derive(Serialize, Deserialize)]
pub struct StopArrivalsResponseData {
    pub stop_code: String,
    pub stop: Option<Stop>,
    pub href: Option<String>,
    pub status: StopArrivalsStatus,
    pub arrivals: Vec<ArrivalEstimate>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct StopArrivalsResponse {
    pub data: StopArrivalsResponseData,
}

/// The slug is only cosmetic; the stop code alone selects the stop.
pub async fn get_stop_arrivals(
    State(state): State<AppState>,
    Path((stop_code, _slug)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let stop_code = stop_code.trim().to_string();
    if stop_code.is_empty() {
        return Err(AppError::bad_request("Stop code must not be empty"));
    }

    let outcome = state
        .arrival_service
        .fetch_arrivals(&stop_code)
        .await
        .map_err(|e| {
            error!("Failed to fetch arrivals for {}: {}", stop_code, e);
            AppError::from(e)
        })?;

    let (status, arrivals) = match outcome {
        ArrivalOutcome::Arrivals(arrivals) => (StopArrivalsStatus::Arrivals, arrivals),
        ArrivalOutcome::NoService => (StopArrivalsStatus::NoService, Vec::new()),
    };

    let stop = state.catalog.find(&stop_code).await;
    let href = stop.as_ref().map(|s| stop_href(&s.code, &s.name));

    Ok((
        StatusCode::OK,
        Json(StopArrivalsResponse {
            data: StopArrivalsResponseData {
                stop_code,
                stop,
                href,
                status,
                arrivals,
                fetched_at: Utc::now(),
            },
        }),
    )
        .into_response())
}
