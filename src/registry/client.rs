use super::error::RegistryError;
use super::types::RegistrationRecord;
use async_trait::async_trait;

/// The service registry the registrator writes to
///
/// The registry is the only source of truth for what is registered; the
/// engine keeps no copy. Implementations are shared across concurrent tasks.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Inserts or replaces the record with the same ID
    async fn upsert(&self, record: &RegistrationRecord) -> Result<(), RegistryError>;

    /// Removes a record; removing an unknown ID succeeds
    async fn remove(&self, service_id: &str) -> Result<(), RegistryError>;

    /// IDs of records whose `container_id` metadata equals `short_container_id`
    async fn find_by_container(&self, short_container_id: &str)
        -> Result<Vec<String>, RegistryError>;

    /// Name of the local registry agent; used as a connectivity probe
    async fn agent_name(&self) -> Result<String, RegistryError>;

    fn name(&self) -> &str;
}
