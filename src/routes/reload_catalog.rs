use crate::{types::app_state::AppState, utils::app_error::AppError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Serialize, Deserialize)]
pub struct ReloadCatalogResponseData {
    pub stop_count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct ReloadCatalogResponse {
    pub data: ReloadCatalogResponseData,
}

pub async fn reload_catalog(State(state): State<AppState>) -> Result<Response, AppError> {
    let stop_count = state.catalog.load().await.map_err(|e| {
        error!("Failed to reload stop catalog: {}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::OK,
        Json(ReloadCatalogResponse {
            data: ReloadCatalogResponseData { stop_count },
        }),
    )
        .into_response())
}
