use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::watch,
    time::{interval, sleep, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    services::arrival_service::{
        arrival_service::{ArrivalOutcome, ArrivalSource},
        types::arrival_error::ArrivalError,
    },
    types::arrival_estimate::ArrivalEstimate,
};

#[derive(Clone, Copy, Debug)]
pub struct BoardTimings {
    pub poll_interval: Duration,
    pub clock_interval: Duration,
    /// How long a manual refresh keeps `refreshing` raised, even if the fetch is faster.
    pub min_refresh_feedback: Duration,
}

impl Default for BoardTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            clock_interval: Duration::from_secs(1),
            min_refresh_feedback: Duration::from_millis(600),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BoardStatus {
    Loading,
    Ready,
    NoService,
    /// Polling stays suspended until [`ArrivalBoard::retry`].
    Failed { kind: String, message: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct BoardSnapshot {
    pub stop_code: String,
    pub clock: DateTime<Utc>,
    pub status: BoardStatus,
    pub arrivals: Vec<ArrivalEstimate>,
    pub last_updated: Option<DateTime<Utc>>,
    pub refreshing: bool,
    /// Sequence number of the fetch whose result is shown.
    pub sequence: u64,
}

struct BoardInner {
    stop_code: String,
    source: Arc<dyn ArrivalSource>,
    timings: BoardTimings,
    snapshot: watch::Sender<BoardSnapshot>,
    next_sequence: AtomicU64,
    manual_in_flight: AtomicUsize,
}

impl BoardInner {
    fn new(stop_code: String, source: Arc<dyn ArrivalSource>, timings: BoardTimings) -> Self {
        let (snapshot, _) = watch::channel(BoardSnapshot {
            stop_code: stop_code.clone(),
            clock: Utc::now(),
            status: BoardStatus::Loading,
            arrivals: Vec::new(),
            last_updated: None,
            refreshing: false,
            sequence: 0,
        });

        Self {
            stop_code,
            source,
            timings,
            snapshot,
            next_sequence: AtomicU64::new(0),
            manual_in_flight: AtomicUsize::new(0),
        }
    }

    fn issue_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_suspended(&self) -> bool {
        matches!(self.snapshot.borrow().status, BoardStatus::Failed { .. })
    }

    /// Applies a fetch result unless a newer one is already shown. Returns whether it was applied.
    fn apply(&self, sequence: u64, result: Result<ArrivalOutcome, ArrivalError>) -> bool {
        self.snapshot.send_if_modified(|snap| {
            if sequence <= snap.sequence {
                debug!(
                    stop_code = %self.stop_code,
                    sequence,
                    applied = snap.sequence,
                    "Discarding stale arrival response"
                );
                return false;
            }

            snap.sequence = sequence;
            match result {
                Ok(ArrivalOutcome::Arrivals(arrivals)) => {
                    snap.status = BoardStatus::Ready;
                    snap.arrivals = arrivals;
                    snap.last_updated = Some(Utc::now());
                }
                Ok(ArrivalOutcome::NoService) => {
                    snap.status = BoardStatus::NoService;
                    snap.arrivals.clear();
                    snap.last_updated = Some(Utc::now());
                }
                Err(e) => {
                    warn!(stop_code = %self.stop_code, error = %e, "Arrival refresh failed, polling suspended");
                    snap.status = BoardStatus::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    };
                    snap.arrivals.clear();
                }
            }
            true
        })
    }

    fn begin_refresh(&self) {
        self.manual_in_flight.fetch_add(1, Ordering::SeqCst);
        self.publish_refreshing();
    }

    fn end_refresh(&self) {
        self.manual_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.publish_refreshing();
    }

    fn publish_refreshing(&self) {
        let refreshing = self.manual_in_flight.load(Ordering::SeqCst) > 0;
        self.snapshot.send_if_modified(|snap| {
            if snap.refreshing == refreshing {
                return false;
            }
            snap.refreshing = refreshing;
            true
        });
    }

    fn tick_clock(&self) {
        self.snapshot.send_modify(|snap| snap.clock = Utc::now());
    }

    fn clear_failure(&self) {
        self.snapshot.send_if_modified(|snap| {
            if !matches!(snap.status, BoardStatus::Failed { .. }) {
                return false;
            }
            snap.status = BoardStatus::Loading;
            true
        });
    }
}

/// Spawns one fetch. It stops as soon as `cancel` fires, without touching the board.
fn spawn_fetch(inner: Arc<BoardInner>, cancel: CancellationToken, manual: bool) {
    let sequence = inner.issue_sequence();
    if manual {
        inner.begin_refresh();
    }

    tokio::spawn(async move {
        let work = async {
            let fetch = async {
                let result = inner.source.fetch_arrivals(&inner.stop_code).await;
                inner.apply(sequence, result);
            };

            if manual {
                tokio::join!(fetch, sleep(inner.timings.min_refresh_feedback));
                inner.end_refresh();
            } else {
                fetch.await;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => debug!(sequence, "Arrival fetch cancelled"),
            _ = work => {}
        }
    });
}

async fn run(inner: Arc<BoardInner>, cancel: CancellationToken) {
    let mut poll = interval(inner.timings.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = interval(inner.timings.clock_interval);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = poll.tick() => {
                if inner.is_suspended() {
                    debug!(stop_code = %inner.stop_code, "Skipping poll while failed");
                } else {
                    spawn_fetch(inner.clone(), cancel.clone(), false);
                }
            }
            _ = clock.tick() => inner.tick_clock(),
        }
    }

    info!(stop_code = %inner.stop_code, "Arrival board stopped");
}

/// Live arrivals for one stop: periodic refresh, a ticking clock and manual refresh.
///
/// Dropping the board stops the poll loop and cancels every fetch still in flight.
pub struct ArrivalBoard {
    inner: Arc<BoardInner>,
    cancel: CancellationToken,
}

impl ArrivalBoard {
    pub fn start(
        stop_code: impl Into<String>,
        source: Arc<dyn ArrivalSource>,
        timings: BoardTimings,
    ) -> Self {
        let inner = Arc::new(BoardInner::new(stop_code.into(), source, timings));
        let cancel = CancellationToken::new();

        info!(stop_code = %inner.stop_code, "Starting arrival board");
        tokio::spawn(run(inner.clone(), cancel.clone()));

        Self { inner, cancel }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Fetches now. Does not wait for, or suppress, fetches already running.
    pub fn refresh(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        spawn_fetch(self.inner.clone(), self.cancel.clone(), true);
    }

    /// Leaves the failed state, which resumes polling, and fetches now.
    pub fn retry(&self) {
        self.inner.clear_failure();
        self.refresh();
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the board has been shut down.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }
}

impl Drop for ArrivalBoard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
