use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::arrival_board::{ArrivalBoard, BoardTimings};
use crate::services::arrival_service::arrival_service::ArrivalSource;

/// Boards currently shown by at least one live subscriber, one per stop.
///
/// Only subscribers hold a board strongly. When the last one goes away the board is dropped,
/// which stops its polling, and the entry here becomes dead.
#[derive(Clone)]
pub struct LiveBoards {
    source: Arc<dyn ArrivalSource>,
    timings: BoardTimings,
    boards: Arc<RwLock<HashMap<String, Weak<ArrivalBoard>>>>,
}

impl LiveBoards {
    pub fn new(source: Arc<dyn ArrivalSource>, timings: BoardTimings) -> Self {
        Self {
            source,
            timings,
            boards: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Joins the running board for `stop_code`, or starts one.
    pub async fn open(&self, stop_code: &str) -> Arc<ArrivalBoard> {
        let mut boards = self.boards.write().await;
        if let Some(board) = boards.get(stop_code).and_then(Weak::upgrade) {
            debug!(stop_code, "Joining running arrival board");
            return board;
        }

        boards.retain(|_, board| board.strong_count() > 0);

        let board = Arc::new(ArrivalBoard::start(
            stop_code,
            self.source.clone(),
            self.timings,
        ));
        boards.insert(stop_code.to_string(), Arc::downgrade(&board));
        board
    }

    pub async fn get(&self, stop_code: &str) -> Option<Arc<ArrivalBoard>> {
        self.boards
            .read()
            .await
            .get(stop_code)
            .and_then(Weak::upgrade)
    }

    /// Shuts down every running board. Their subscriber streams end.
    pub async fn shutdown_all(&self) {
        let mut boards = self.boards.write().await;
        let live: Vec<_> = boards.drain().filter_map(|(_, b)| b.upgrade()).collect();

        info!(boards = live.len(), "Shutting down live arrival boards");
        for board in live {
            board.shutdown();
        }
    }
}
