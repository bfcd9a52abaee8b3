use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream};
use tracing::{error, info};

use crate::{types::app_state::AppState, utils::app_error::AppError};

/// Streams board snapshots as server-sent events. Subscribers to the same stop share one board;
/// the stream holds it, so once every subscriber disconnects the board is dropped and polling
/// stops.
pub async fn get_stop_arrivals_live(
    State(state): State<AppState>,
    Path((stop_code, _slug)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let stop_code = stop_code.trim().to_string();
    if stop_code.is_empty() {
        return Err(AppError::bad_request("Stop code must not be empty"));
    }
    info!(stop_code = %stop_code, "Live arrivals subscriber connected");

    let board = state.live_boards.open(&stop_code).await;
    let rx = board.subscribe();

    let events = stream::unfold((board, rx, true), |(board, mut rx, first)| async move {
        if !first {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                _ = board.closed() => return None,
            }
        }

        let snapshot = rx.borrow_and_update().clone();
        match Event::default().event("snapshot").json_data(&snapshot) {
            Ok(event) => Some((Ok(event), (board, rx, false))),
            Err(e) => {
                error!("Failed to encode board snapshot: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
