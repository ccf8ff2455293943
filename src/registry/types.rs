//! Registry record types
//!
//! Field names serialize to the Consul agent API's PascalCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the owning container's short ID
pub const META_CONTAINER_ID: &str = "container_id";

/// Metadata key holding the container's image reference
pub const META_IMAGE: &str = "image";

/// TCP health check the registry runs against a registered endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    pub name: String,
    /// `host:port` to dial
    #[serde(rename = "TCP")]
    pub tcp: String,
    pub interval: String,
    pub timeout: String,
    pub deregister_critical_service_after: String,
}

/// The unit materialized into the registry, one per endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationRecord {
    /// Deterministic `hostname-service-port` identifier
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub meta: BTreeMap<String, String>,
    pub check: HealthCheck,
}

/// A service as reported back by the registry; only the ID is needed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredService {
    #[serde(rename = "ID")]
    pub id: String,
}
