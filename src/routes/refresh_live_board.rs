use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{
    services::arrival_board::{arrival_board::ArrivalBoard, BoardSnapshot},
    types::app_state::AppState,
    utils::app_error::AppError,
};

#[derive(Serialize)]
pub struct LiveBoardResponse {
    pub data: BoardSnapshot,
}

async fn live_board(state: &AppState, stop_code: &str) -> Result<Arc<ArrivalBoard>, AppError> {
    state
        .live_boards
        .get(stop_code.trim())
        .await
        .ok_or_else(|| AppError::not_found("No live board is open for this stop"))
}

fn accepted(board: &ArrivalBoard) -> Response {
    (
        StatusCode::ACCEPTED,
        Json(LiveBoardResponse {
            data: board.snapshot(),
        }),
    )
        .into_response()
}

/// Manual refresh of a live board. Subscribers see `refreshing` raised and then the new result.
pub async fn refresh_live_board(
    State(state): State<AppState>,
    Path((stop_code, _slug)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let board = live_board(&state, &stop_code).await?;
    info!(stop_code = %stop_code.trim(), "Manual refresh requested");
    board.refresh();

    Ok(accepted(&board))
}

/// Clears a failed live board and fetches again, which also resumes polling.
pub async fn retry_live_board(
    State(state): State<AppState>,
    Path((stop_code, _slug)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let board = live_board(&state, &stop_code).await?;
    info!(stop_code = %stop_code.trim(), "Retry requested");
    board.retry();

    Ok(accepted(&board))
}
