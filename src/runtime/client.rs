use super::error::RuntimeError;
use super::types::{ContainerSnapshot, LifecycleEvent};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Stream of lifecycle events; an `Err` item means the subscription is broken
pub type EventStream = BoxStream<'static, Result<LifecycleEvent, RuntimeError>>;

/// The container runtime the registrator observes
///
/// Implementations are shared across concurrent tasks and must be safe to call
/// from several of them at once.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// IDs of all currently running containers
    async fn list_running(&self) -> Result<Vec<String>, RuntimeError>;

    /// Current metadata for a container, or `RuntimeError::NotFound` if it is gone
    async fn inspect(&self, container_id: &str) -> Result<ContainerSnapshot, RuntimeError>;

    /// Subscribes to container start/die/stop events
    fn events(&self) -> EventStream;

    fn name(&self) -> &str;
}
