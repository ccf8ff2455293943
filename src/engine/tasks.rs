//! Bounded group of independent per-event tasks

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Runs event tasks concurrently with at most `limit` executing at once
///
/// Tasks do not coordinate with each other. Dropping the group aborts
/// whatever is still running.
pub struct TaskGroup {
    tasks: JoinSet<()>,
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter however the task ends
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TaskGroup {
    pub fn new(limit: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            permits: Arc::new(Semaphore::new(limit.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawns a task; it waits for a permit before running `work`
    pub fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let permits = Arc::clone(&self.permits);

        self.tasks.spawn(async move {
            let _guard = guard;
            // The semaphore is never closed
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            work.await;
        });
    }

    /// Spawned tasks that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the next task to finish; `None` when the group is empty
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        self.tasks.join_next().await
    }

    /// Waits up to `grace` for outstanding tasks, then aborts the rest
    ///
    /// Returns the number of tasks that were aborted.
    pub async fn drain(&mut self, grace: Duration) -> usize {
        if self.tasks.is_empty() {
            return 0;
        }

        debug!(in_flight = self.in_flight(), "Draining in-flight tasks");

        let tasks = &mut self.tasks;
        let finished = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                log_join_result(joined);
            }
        })
        .await;

        if finished.is_ok() {
            return 0;
        }

        let remaining = self.tasks.len();
        warn!(remaining, "Shutdown grace period elapsed, aborting in-flight tasks");
        self.tasks.shutdown().await;
        remaining
    }
}

/// Logs a task that panicked or was cancelled
pub fn log_join_result(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            warn!("Event task panicked: {}", e);
        } else {
            debug!("Event task cancelled: {}", e);
        }
    }
}
