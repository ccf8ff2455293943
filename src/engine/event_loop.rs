//! Steady-state event loop
//!
//! Multiplexes the runtime event stream, completed tasks and a shutdown
//! signal. Each start/die/stop event becomes an independent task in a
//! [`TaskGroup`]; there is no per-container ordering between tasks.

use super::reconciler::Reconciler;
use super::tasks::{log_join_result, TaskGroup};
use super::EngineError;
use crate::runtime::{EventStream, LifecycleAction, LifecycleEvent};
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

pub struct EventLoop {
    reconciler: Arc<Reconciler>,
    tasks: TaskGroup,
}

impl EventLoop {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        let tasks = TaskGroup::new(reconciler.settings().max_in_flight);
        Self { reconciler, tasks }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.in_flight()
    }

    /// Runs until `shutdown` resolves or the event stream fails
    ///
    /// On shutdown, in-flight tasks get the configured grace period to finish.
    /// A stream error or the stream ending is returned as fatal.
    pub async fn run<S>(mut self, mut events: EventStream, shutdown: S) -> Result<(), EngineError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Listening for container events");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(in_flight = self.tasks.in_flight(), "Shutting down event loop");
                    break;
                }

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    log_join_result(joined);
                }

                item = events.next() => match item {
                    Some(Ok(event)) => self.dispatch(event),
                    Some(Err(e)) => {
                        error!("Event stream failed: {}", e);
                        return Err(EngineError::EventStream(e));
                    }
                    None => {
                        error!("Event stream closed");
                        return Err(EngineError::EventStreamClosed);
                    }
                },
            }
        }

        let grace = self.reconciler.settings().shutdown_grace;
        let aborted = self.tasks.drain(grace).await;
        if aborted > 0 {
            debug!(aborted, "Abandoned in-flight tasks");
        }
        Ok(())
    }

    fn dispatch(&mut self, event: LifecycleEvent) {
        if let LifecycleAction::Other(action) = &event.action {
            trace!(container_id = %event.container_id, action = %action, "Ignoring event");
            return;
        }

        debug!(
            container_id = %event.container_id,
            action = %event.action,
            in_flight = self.tasks.in_flight(),
            "Dispatching event"
        );

        let reconciler = Arc::clone(&self.reconciler);
        self.tasks.spawn(async move {
            reconciler.handle_event(&event).await;
        });
    }
}
