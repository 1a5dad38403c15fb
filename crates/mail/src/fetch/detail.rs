//! Fan-out/fan-in of detail lookups

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use super::CancellationToken;
use crate::error::{Error, Result};
use crate::models::{Item, MessageId};
use crate::remote::DetailClient;

/// How often the fan-in wakes up to check for cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of fetching one id
#[derive(Debug)]
pub struct FetchOutcome {
    pub id: MessageId,
    pub result: Result<Item>,
}

/// Resolves message ids into items on a bounded worker pool
///
/// Each id becomes one job on the pool; at most `max_concurrent` detail
/// requests run at once. Results are collected through a single channel
/// sized to the batch.
pub struct DetailFetcher<D> {
    client: Arc<D>,
    pool: rayon::ThreadPool,
}

impl<D: DetailClient + 'static> DetailFetcher<D> {
    pub fn new(client: Arc<D>, max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(Error::InvalidConfig(
                "detail fetcher needs at least one worker".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrent)
            .thread_name(|i| format!("detail-fetch-{i}"))
            .panic_handler(|_| log::error!("[FETCH] Detail worker panicked"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        Ok(Self { client, pool })
    }

    /// Number of worker threads
    pub fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fetch every id and return one outcome per input id.
    ///
    /// Outcomes arrive in completion order, not input order; sort the
    /// successful items (see [`crate::models::sort_by_timestamp`]) before
    /// presenting them. A failing id never holds up the others. If `cancel`
    /// fires, ids not yet reported come back as [`Error::Cancelled`] and the
    /// call returns without waiting for requests still in flight.
    pub fn fetch_all(&self, ids: &[MessageId], cancel: &CancellationToken) -> Vec<FetchOutcome> {
        if ids.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let (tx, rx) = mpsc::sync_channel::<FetchOutcome>(ids.len());

        for id in ids {
            let tx = tx.clone();
            let client = Arc::clone(&self.client);
            let cancel = cancel.clone();
            let id = id.clone();

            self.pool.spawn(move || {
                let result = if cancel.is_cancelled() {
                    Err(Error::Cancelled)
                } else {
                    client.get(&id)
                };
                // The receiver is gone if the caller stopped waiting
                let _ = tx.send(FetchOutcome { id, result });
            });
        }
        drop(tx);

        // Ids not yet reported, with multiplicity
        let mut outstanding: HashMap<&MessageId, usize> = HashMap::new();
        for id in ids {
            *outstanding.entry(id).or_default() += 1;
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        let mut record = |outcome: FetchOutcome, outcomes: &mut Vec<FetchOutcome>| {
            if let Some(n) = outstanding.get_mut(&outcome.id) {
                *n -= 1;
            }
            outcomes.push(outcome);
        };

        let mut stop_reason = None;
        while outcomes.len() < ids.len() {
            if cancel.is_cancelled() {
                while let Ok(outcome) = rx.try_recv() {
                    record(outcome, &mut outcomes);
                }
                if outcomes.len() < ids.len() {
                    stop_reason = Some(StopReason::Cancelled);
                }
                break;
            }

            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(outcome) => record(outcome, &mut outcomes),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    stop_reason = Some(StopReason::WorkerLost);
                    break;
                }
            }
        }

        if let Some(reason) = stop_reason {
            for (id, remaining) in outstanding {
                for _ in 0..remaining {
                    outcomes.push(FetchOutcome {
                        id: id.clone(),
                        result: Err(reason.to_error()),
                    });
                }
            }
            log::warn!("[FETCH] Batch stopped early: {:?}", reason);
        }

        let failures = outcomes.iter().filter(|o| o.result.is_err()).count();
        log::debug!(
            "[FETCH] {} ids, {} failed, {}ms",
            ids.len(),
            failures,
            started.elapsed().as_millis()
        );

        outcomes
    }
}

#[derive(Debug, Clone, Copy)]
enum StopReason {
    Cancelled,
    WorkerLost,
}

impl StopReason {
    fn to_error(self) -> Error {
        match self {
            StopReason::Cancelled => Error::Cancelled,
            StopReason::WorkerLost => {
                Error::Transport("detail worker exited without a result".to_string())
            }
        }
    }
}
