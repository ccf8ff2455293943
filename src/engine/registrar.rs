use crate::registry::{HealthCheck, RegistrationRecord, ServiceRegistry};
use crate::service::{Endpoint, ServiceDescriptor};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Health check cadence handed to the registry
pub const CHECK_INTERVAL: &str = "15s";
pub const CHECK_TIMEOUT: &str = "5s";
pub const DEREGISTER_CRITICAL_AFTER: &str = "1m";

/// Per-container result of a registration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    pub failed: usize,
    /// Endpoints dropped because their host port was unusable
    pub skipped: usize,
}

/// Upserts one registry record per endpoint
pub struct Registrar {
    registry: Arc<dyn ServiceRegistry>,
    node_address: String,
    node_hostname: String,
}

impl Registrar {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        node_address: impl Into<String>,
        node_hostname: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            node_address: node_address.into(),
            node_hostname: node_hostname.into(),
        }
    }

    /// `hostname-service-port`; the same inputs always give the same ID
    pub fn record_id(&self, service: &str, host_port: u16) -> String {
        format!("{}-{}-{}", self.node_hostname, service, host_port)
    }

    pub fn build_record(
        &self,
        descriptor: &ServiceDescriptor,
        endpoint: &Endpoint,
    ) -> RegistrationRecord {
        let mut tags = Vec::with_capacity(descriptor.tags.len() + 1);
        tags.push(endpoint.protocol.to_string());
        tags.extend(descriptor.tags.iter().cloned());

        RegistrationRecord {
            id: self.record_id(&descriptor.name, endpoint.host_port),
            name: descriptor.name.clone(),
            tags,
            address: self.node_address.clone(),
            port: endpoint.host_port,
            meta: descriptor.meta.clone(),
            check: HealthCheck {
                name: format!("TCP Check {}", descriptor.name),
                tcp: format!("{}:{}", self.node_address, endpoint.host_port),
                interval: CHECK_INTERVAL.to_string(),
                timeout: CHECK_TIMEOUT.to_string(),
                deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER.to_string(),
            },
        }
    }

    /// Submits every endpoint independently
    ///
    /// A failed upsert is logged and does not stop the remaining endpoints;
    /// nothing is retried here.
    pub async fn register(
        &self,
        descriptor: &ServiceDescriptor,
        endpoints: &[Endpoint],
    ) -> RegistrationSummary {
        let mut summary = RegistrationSummary::default();

        for endpoint in endpoints {
            if !endpoint.is_routable() {
                debug!(
                    service = %descriptor.name,
                    container_port = endpoint.container_port,
                    "Skipping endpoint without a usable host port"
                );
                summary.skipped += 1;
                continue;
            }

            let record = self.build_record(descriptor, endpoint);
            match self.registry.upsert(&record).await {
                Ok(()) => {
                    info!(
                        service = %record.name,
                        service_id = %record.id,
                        "Registered {}:{}",
                        record.address,
                        record.port
                    );
                    summary.registered += 1;
                }
                Err(e) => {
                    error!(
                        service = %record.name,
                        service_id = %record.id,
                        "Registration failed: {}",
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
