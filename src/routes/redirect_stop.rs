use crate::{
    types::app_state::AppState,
    utils::{app_error::AppError, slug::stop_href},
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

/// Sends a bare `/stops/{code}` to the canonical URL with the stop's slug.
pub async fn redirect_stop(
    State(state): State<AppState>,
    Path(stop_code): Path<String>,
) -> Result<Response, AppError> {
    let stops = state.catalog.stops_or_load().await.map_err(|e| {
        error!("Failed to load stop catalog: {}", e);
        AppError::from(e)
    })?;

    let stop = stops
        .iter()
        .find(|s| s.code == stop_code.trim())
        .ok_or_else(|| AppError::not_found("Stop does not exist"))?;

    Ok(Redirect::permanent(&stop_href(&stop.code, &stop.name)).into_response())
}
