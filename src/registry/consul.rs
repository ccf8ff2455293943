//! Consul agent HTTP client
//!
//! Talks to the local Consul agent's `/v1/agent/*` endpoints:
//!
//! - `PUT /v1/agent/service/register` to upsert a record
//! - `PUT /v1/agent/service/deregister/{id}` to remove one
//! - `GET /v1/agent/services?filter=...` to find records owned by a container
//! - `GET /v1/agent/self` for the node name
//!
//! # Example
//!
//! ```no_run
//! use registrator::registry::{ConsulRegistry, ServiceRegistry};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let consul = ConsulRegistry::new("http://localhost:8500", Duration::from_secs(10))?;
//! println!("Connected to {}", consul.agent_name().await?);
//! # Ok(())
//! # }
//! ```

use super::client::ServiceRegistry;
use super::error::RegistryError;
use super::types::{RegisteredService, RegistrationRecord, META_CONTAINER_ID};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub struct ConsulRegistry {
    /// Base URL without a trailing slash
    base_url: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct AgentSelf {
    #[serde(rename = "Config")]
    config: AgentSelfConfig,
}

#[derive(Debug, Deserialize)]
struct AgentSelfConfig {
    #[serde(rename = "NodeName")]
    node_name: String,
}

impl ConsulRegistry {
    /// Creates a client for the agent at `url`
    ///
    /// A bare `host:port` is treated as `http://host:port`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let base_url = normalize_url(url)?;

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Configuration(e.to_string()))?;

        debug!("Consul client targeting {}", base_url);

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Deregister URL with the service ID percent-encoded as one path segment
    fn deregister_url(&self, service_id: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistryError::Configuration(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| {
                RegistryError::Configuration(format!("Cannot extend URL {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v1", "agent", "service", "deregister", service_id]);

        Ok(url)
    }
}

/// Normalizes a registry URL into `scheme://host[:port][/path]` without a trailing slash
pub fn normalize_url(url: &str) -> Result<String, RegistryError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Configuration(
            "Registry URL is empty".to_string(),
        ));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| RegistryError::Configuration(format!("Invalid registry URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RegistryError::Configuration(format!(
                "Unsupported registry URL scheme '{}'. Expected http or https",
                other
            )))
        }
    }

    Ok(candidate.trim_end_matches('/').to_string())
}

async fn ensure_success(response: Response) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(RegistryError::Status {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn upsert(&self, record: &RegistrationRecord) -> Result<(), RegistryError> {
        let response = self
            .http_client
            .put(self.endpoint("/v1/agent/service/register"))
            .json(record)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn remove(&self, service_id: &str) -> Result<(), RegistryError> {
        let response = self
            .http_client
            .put(self.deregister_url(service_id)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(service_id, "Service already absent from Consul");
            return Ok(());
        }

        ensure_success(response).await?;
        Ok(())
    }

    async fn find_by_container(
        &self,
        short_container_id: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let filter = format!("Meta.{} == \"{}\"", META_CONTAINER_ID, short_container_id);

        let response = self
            .http_client
            .get(self.endpoint("/v1/agent/services"))
            .query(&[("filter", filter.as_str())])
            .send()
            .await?;

        let services: HashMap<String, RegisteredService> =
            ensure_success(response).await?.json().await?;

        let mut ids: Vec<String> = services.into_values().map(|s| s.id).collect();
        ids.sort();
        Ok(ids)
    }

    async fn agent_name(&self) -> Result<String, RegistryError> {
        let response = self
            .http_client
            .get(self.endpoint("/v1/agent/self"))
            .send()
            .await?;

        let agent: AgentSelf = ensure_success(response).await?.json().await?;
        Ok(agent.config.node_name)
    }

    fn name(&self) -> &str {
        "consul"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_keeps_scheme() {
        assert_eq!(
            normalize_url("http://discovery-service:8500").unwrap(),
            "http://discovery-service:8500"
        );
        assert_eq!(
            normalize_url("https://consul.example.com/").unwrap(),
            "https://consul.example.com"
        );
    }

    #[test]
    fn test_normalize_url_adds_http_scheme() {
        assert_eq!(
            normalize_url("localhost:8500").unwrap(),
            "http://localhost:8500"
        );
    }

    #[test]
    fn test_normalize_url_rejects_bad_input() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("ftp://consul:21").is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let consul = ConsulRegistry::new("http://consul:8500/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            consul.endpoint("/v1/agent/self"),
            "http://consul:8500/v1/agent/self"
        );
        assert_eq!(consul.name(), "consul");
    }

    #[test]
    fn test_deregister_url_plain_id() {
        let consul = ConsulRegistry::new("http://consul:8500", Duration::from_secs(1)).unwrap();
        assert_eq!(
            consul.deregister_url("node1-auth-33001").unwrap().as_str(),
            "http://consul:8500/v1/agent/service/deregister/node1-auth-33001"
        );
    }

    #[test]
    fn test_deregister_url_escapes_reserved_characters() {
        let consul = ConsulRegistry::new("http://consul:8500", Duration::from_secs(1)).unwrap();
        assert_eq!(
            consul.deregister_url("node1-a/b?c#d-30000").unwrap().as_str(),
            "http://consul:8500/v1/agent/service/deregister/node1-a%2Fb%3Fc%23d-30000"
        );
    }

    #[test]
    fn test_deregister_url_keeps_base_path() {
        let consul =
            ConsulRegistry::new("https://gateway/consul/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            consul.deregister_url("web-1").unwrap().as_str(),
            "https://gateway/consul/v1/agent/service/deregister/web-1"
        );
    }
}
