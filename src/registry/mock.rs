use super::client::ServiceRegistry;
use super::error::RegistryError;
use super::types::{RegistrationRecord, META_CONTAINER_ID};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// A call received by [`MockRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Upsert(RegistrationRecord),
    Remove(String),
    FindByContainer(String),
    AgentName,
}

/// In-memory registry for tests
///
/// Keeps the current records keyed by ID plus a log of every call.
pub struct MockRegistry {
    records: Mutex<BTreeMap<String, RegistrationRecord>>,
    calls: Mutex<Vec<RegistryCall>>,
    failing_ids: Mutex<HashSet<String>>,
    unreachable: Mutex<bool>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failing_ids: Mutex::new(HashSet::new()),
            unreachable: Mutex::new(false),
        }
    }

    /// Makes upserts of the given record ID fail
    pub fn fail_upsert(&self, service_id: impl Into<String>) {
        self.failing_ids.lock().unwrap().insert(service_id.into());
    }

    /// Makes every call fail with a transport error
    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    /// Seeds a record without logging a call
    pub fn insert(&self, record: RegistrationRecord) {
        self.records.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn records(&self) -> Vec<RegistrationRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    pub fn record(&self, service_id: &str) -> Option<RegistrationRecord> {
        self.records.lock().unwrap().get(service_id).cloned()
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Every record submitted through `upsert`, in call order
    pub fn upserts(&self) -> Vec<RegistrationRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RegistryCall::Upsert(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Every ID passed to `remove`, in call order
    pub fn removals(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RegistryCall::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: RegistryCall) -> Result<(), RegistryError> {
        self.calls.lock().unwrap().push(call);
        if *self.unreachable.lock().unwrap() {
            return Err(RegistryError::Transport(
                "mock registry unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceRegistry for MockRegistry {
    async fn upsert(&self, record: &RegistrationRecord) -> Result<(), RegistryError> {
        self.log(RegistryCall::Upsert(record.clone()))?;

        if self.failing_ids.lock().unwrap().contains(&record.id) {
            return Err(RegistryError::Status {
                status: 500,
                message: format!("rejected {}", record.id),
            });
        }

        self.insert(record.clone());
        Ok(())
    }

    async fn remove(&self, service_id: &str) -> Result<(), RegistryError> {
        self.log(RegistryCall::Remove(service_id.to_string()))?;
        self.records.lock().unwrap().remove(service_id);
        Ok(())
    }

    async fn find_by_container(
        &self,
        short_container_id: &str,
    ) -> Result<Vec<String>, RegistryError> {
        self.log(RegistryCall::FindByContainer(short_container_id.to_string()))?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.meta.get(META_CONTAINER_ID).map(String::as_str) == Some(short_container_id))
            .map(|r| r.id.clone())
            .collect())
    }

    async fn agent_name(&self) -> Result<String, RegistryError> {
        self.log(RegistryCall::AgentName)?;
        Ok("mock-agent".to_string())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRegistry")
            .field("records", &self.records.lock().unwrap().len())
            .field("calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::HealthCheck;

    fn record(id: &str, container: &str) -> RegistrationRecord {
        let mut meta = BTreeMap::new();
        meta.insert(META_CONTAINER_ID.to_string(), container.to_string());
        RegistrationRecord {
            id: id.to_string(),
            name: "svc".to_string(),
            tags: vec![],
            address: "127.0.0.1".to_string(),
            port: 80,
            meta,
            check: HealthCheck {
                name: "TCP Check svc".to_string(),
                tcp: "127.0.0.1:80".to_string(),
                interval: "15s".to_string(),
                timeout: "5s".to_string(),
                deregister_critical_service_after: "1m".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let registry = MockRegistry::new();
        registry.upsert(&record("a", "c1")).await.unwrap();
        registry.upsert(&record("a", "c1")).await.unwrap();

        assert_eq!(registry.records().len(), 1);
        assert_eq!(registry.upserts().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_container() {
        let registry = MockRegistry::new();
        registry.insert(record("a", "c1"));
        registry.insert(record("b", "c1"));
        registry.insert(record("c", "c2"));

        let ids = registry.find_by_container("c1").await.unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_upsert_is_not_stored() {
        let registry = MockRegistry::new();
        registry.fail_upsert("a");
        assert!(registry.upsert(&record("a", "c1")).await.is_err());
        assert!(registry.record("a").is_none());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let registry = MockRegistry::new();
        registry.set_unreachable(true);
        assert!(matches!(
            registry.agent_name().await,
            Err(RegistryError::Transport(_))
        ));
    }
}
