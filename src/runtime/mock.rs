use super::client::{ContainerRuntime, EventStream};
use super::error::RuntimeError;
use super::types::{ContainerSnapshot, LifecycleEvent};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sender half used by tests to push events into a [`MockRuntime`]
pub type MockEventSender = mpsc::UnboundedSender<Result<LifecycleEvent, RuntimeError>>;

/// In-memory container runtime for tests
///
/// Each container holds a queue of snapshots: inspection pops the front while
/// more than one remains, then keeps returning the last one. This lets tests
/// model a container whose ports appear only after a few inspections.
pub struct MockRuntime {
    containers: Mutex<HashMap<String, VecDeque<ContainerSnapshot>>>,
    running: Mutex<Vec<String>>,
    list_error: Mutex<Option<String>>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<Result<LifecycleEvent, RuntimeError>>>>,
    events_tx: Mutex<Option<MockEventSender>>,
    inspections: AtomicUsize,
}

impl MockRuntime {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            containers: Mutex::new(HashMap::new()),
            running: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            events_rx: Mutex::new(Some(events_rx)),
            events_tx: Mutex::new(Some(events_tx)),
            inspections: AtomicUsize::new(0),
        }
    }

    /// Adds a running container
    pub fn add_container(&self, snapshot: ContainerSnapshot) {
        self.running.lock().unwrap().push(snapshot.id.clone());
        self.push_snapshot(snapshot);
    }

    /// Queues another snapshot for a container without marking it running
    pub fn push_snapshot(&self, snapshot: ContainerSnapshot) {
        self.containers
            .lock()
            .unwrap()
            .entry(snapshot.id.clone())
            .or_default()
            .push_back(snapshot);
    }

    /// Lists an ID as running even though inspection will report it missing
    pub fn add_vanished(&self, container_id: impl Into<String>) {
        self.running.lock().unwrap().push(container_id.into());
    }

    pub fn remove_container(&self, container_id: &str) {
        self.containers.lock().unwrap().remove(container_id);
        self.running.lock().unwrap().retain(|id| id != container_id);
    }

    /// Makes `list_running` fail with the given message
    pub fn fail_listing(&self, message: impl Into<String>) {
        *self.list_error.lock().unwrap() = Some(message.into());
    }

    /// A sender for pushing events; panics after `close_events`
    pub fn event_sender(&self) -> MockEventSender {
        self.events_tx
            .lock()
            .unwrap()
            .clone()
            .expect("event channel already closed")
    }

    /// Drops the runtime's own sender so the stream ends once tests drop theirs
    pub fn close_events(&self) {
        self.events_tx.lock().unwrap().take();
    }

    pub fn inspection_count(&self) -> usize {
        self.inspections.load(Ordering::SeqCst)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn list_running(&self) -> Result<Vec<String>, RuntimeError> {
        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(RuntimeError::Request(message));
        }
        Ok(self.running.lock().unwrap().clone())
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        self.inspections.fetch_add(1, Ordering::SeqCst);

        let mut containers = self.containers.lock().unwrap();
        let queue = containers
            .get_mut(container_id)
            .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))?;

        if queue.len() > 1 {
            queue
                .pop_front()
                .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))
        }
    }

    fn events(&self) -> EventStream {
        match self.events_rx.lock().unwrap().take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => stream::empty().boxed(),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRuntime")
            .field("running", &self.running.lock().unwrap().len())
            .field("inspections", &self.inspection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::HostBinding;

    #[tokio::test]
    async fn test_inspect_unknown_container() {
        let runtime = MockRuntime::new();
        let err = runtime.inspect("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_snapshot_queue_advances_then_sticks() {
        let runtime = MockRuntime::new();
        runtime.add_container(ContainerSnapshot::new("c1", "/app"));
        runtime.push_snapshot(
            ContainerSnapshot::new("c1", "/app")
                .with_port("80/tcp", vec![HostBinding::new("", "8080")]),
        );

        assert!(!runtime.inspect("c1").await.unwrap().has_published_ports());
        assert!(runtime.inspect("c1").await.unwrap().has_published_ports());
        assert!(runtime.inspect("c1").await.unwrap().has_published_ports());
        assert_eq!(runtime.inspection_count(), 3);
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let runtime = MockRuntime::new();
        runtime.fail_listing("daemon unavailable");
        assert!(runtime.list_running().await.is_err());
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let runtime = MockRuntime::new();
        let tx = runtime.event_sender();
        tx.send(Ok(LifecycleEvent::start("a"))).unwrap();
        tx.send(Ok(LifecycleEvent::die("a"))).unwrap();

        let mut events = runtime.events();
        assert_eq!(events.next().await.unwrap().unwrap(), LifecycleEvent::start("a"));
        assert_eq!(events.next().await.unwrap().unwrap(), LifecycleEvent::die("a"));
    }

    #[tokio::test]
    async fn test_stream_ends_after_close() {
        let runtime = MockRuntime::new();
        let tx = runtime.event_sender();
        runtime.close_events();
        drop(tx);

        let mut events = runtime.events();
        assert!(events.next().await.is_none());
    }

    #[test]
    fn test_runtime_name() {
        assert_eq!(MockRuntime::new().name(), "mock");
    }

    #[tokio::test]
    async fn test_second_subscription_is_empty() {
        let runtime = MockRuntime::new();
        let _first = runtime.events();
        let mut second = runtime.events();
        assert!(second.next().await.is_none());
    }
}
