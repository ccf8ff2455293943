use crate::registry::ServiceRegistry;
use crate::runtime::short_id;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeregistrationSummary {
    pub removed: usize,
    pub failed: usize,
}

/// Removes the records owned by a container
///
/// Owned records are found by asking the registry for entries whose
/// `container_id` metadata matches, so nothing has to be remembered between
/// registration and removal.
pub struct Deregistrar {
    registry: Arc<dyn ServiceRegistry>,
}

impl Deregistrar {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Removes every record owned by `container_id`; no match is a no-op
    pub async fn deregister(&self, container_id: &str) -> DeregistrationSummary {
        let owner = short_id(container_id);
        let mut summary = DeregistrationSummary::default();

        let service_ids = match self.registry.find_by_container(owner).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(container_id = %owner, "Could not look up registrations: {}", e);
                summary.failed += 1;
                return summary;
            }
        };

        if service_ids.is_empty() {
            debug!(container_id = %owner, "No registrations to remove");
            return summary;
        }

        for service_id in service_ids {
            match self.registry.remove(&service_id).await {
                Ok(()) => {
                    info!(container_id = %owner, service_id = %service_id, "Deregistered");
                    summary.removed += 1;
                }
                Err(e) => {
                    error!(
                        container_id = %owner,
                        service_id = %service_id,
                        "Deregistration failed: {}",
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HealthCheck, MockRegistry, RegistrationRecord, RegistryCall, META_CONTAINER_ID};
    use std::collections::BTreeMap;

    fn record(id: &str, owner: &str) -> RegistrationRecord {
        let mut meta = BTreeMap::new();
        meta.insert(META_CONTAINER_ID.to_string(), owner.to_string());
        RegistrationRecord {
            id: id.to_string(),
            name: "svc".to_string(),
            tags: vec!["tcp".to_string()],
            address: "10.0.0.5".to_string(),
            port: 1,
            meta,
            check: HealthCheck {
                name: "TCP Check svc".to_string(),
                tcp: "10.0.0.5:1".to_string(),
                interval: "15s".to_string(),
                timeout: "5s".to_string(),
                deregister_critical_service_after: "1m".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_removes_only_owned_records() {
        let registry = Arc::new(MockRegistry::new());
        registry.insert(record("node1-a-1", "0123456789ab"));
        registry.insert(record("node1-a-2", "0123456789ab"));
        registry.insert(record("node1-b-3", "ffffffffffff"));

        let deregistrar = Deregistrar::new(registry.clone());
        let summary = deregistrar.deregister("0123456789abcdef0000").await;

        assert_eq!(summary.removed, 2);
        assert_eq!(registry.records().len(), 1);
        assert!(registry.record("node1-b-3").is_some());
    }

    #[tokio::test]
    async fn test_unknown_container_is_noop() {
        let registry = Arc::new(MockRegistry::new());
        let deregistrar = Deregistrar::new(registry.clone());

        let summary = deregistrar.deregister("nothing-here").await;

        assert_eq!(summary, DeregistrationSummary::default());
        assert_eq!(
            registry.calls(),
            vec![RegistryCall::FindByContainer("nothing-here".to_string())]
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_contained() {
        let registry = Arc::new(MockRegistry::new());
        registry.set_unreachable(true);
        let deregistrar = Deregistrar::new(registry.clone());

        let summary = deregistrar.deregister("0123456789ab").await;
        assert_eq!(summary.failed, 1);
        assert!(registry.removals().is_empty());
    }
}
