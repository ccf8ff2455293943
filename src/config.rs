//! Configuration management for the registrator
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! ## Node identity
//! - `NODE_IP`: address advertised for every registration - default: "127.0.0.1"
//! - `CONSUL_URL`: Consul agent URL - default: "http://discovery-service:8500"
//! - `NODE_HOSTNAME`: hostname used in registration IDs - default: OS hostname
//!
//! ## Engine tuning
//! - `REGISTRATOR_NAME_PREFIX`: prefix stripped from container names - default: "sentiric-"
//! - `REGISTRATOR_SETTLE_DELAY_MS`: wait after a start event - default: "1000"
//! - `REGISTRATOR_SETTLE_RETRIES`: extra inspections while ports are unpublished (max 100) - default: "3"
//! - `REGISTRATOR_MAX_IN_FLIGHT`: concurrent event tasks - default: "64"
//! - `REGISTRATOR_SHUTDOWN_GRACE_SECS`: drain window on shutdown - default: "5"
//! - `REGISTRATOR_REQUEST_TIMEOUT_SECS`: Consul HTTP timeout - default: "10"
//!
//! ## Logging
//! - `REGISTRATOR_LOG_LEVEL`: trace|debug|info|warn|error - default: "info"
//! - `REGISTRATOR_LOG_JSON`: JSON log output (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use registrator::RegistratorConfig;
//!
//! let config = RegistratorConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::engine::EngineSettings;
use crate::registry::normalize_url;
use crate::service::DEFAULT_NAME_PREFIX;
use std::env;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NODE_IP: &str = "127.0.0.1";
const DEFAULT_CONSUL_URL: &str = "http://discovery-service:8500";
const DEFAULT_HOSTNAME: &str = "localhost";
const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
const DEFAULT_SETTLE_RETRIES: u32 = 3;
const MAX_SETTLE_RETRIES: u32 = 100;
const DEFAULT_MAX_IN_FLIGHT: usize = 64;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for the registrator
#[derive(Debug, Clone)]
pub struct RegistratorConfig {
    /// Address advertised in every registration
    pub node_ip: String,

    /// Consul agent URL
    pub consul_url: String,

    /// Node hostname; first component of registration IDs
    pub hostname: String,

    /// Application prefix stripped from container names
    pub name_prefix: String,

    /// Delay after a start event before the first inspection
    pub settle_delay_ms: u64,

    /// Additional inspections while a started container shows no published ports
    pub settle_retries: u32,

    /// Maximum concurrent register/deregister tasks
    pub max_in_flight: usize,

    /// How long shutdown waits for in-flight tasks (0 disables draining)
    pub shutdown_grace_secs: u64,

    /// Consul request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON logs
    pub log_json: bool,
}

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

/// The OS hostname, falling back to `localhost`
fn system_hostname() -> String {
    sysinfo::System::host_name()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string())
}

impl Default for RegistratorConfig {
    /// Loads configuration from environment variables, falling back to defaults
    fn default() -> Self {
        let hostname = env::var("NODE_HOSTNAME").unwrap_or_else(|_| system_hostname());

        Self {
            node_ip: env_or("NODE_IP", DEFAULT_NODE_IP),
            consul_url: env_or("CONSUL_URL", DEFAULT_CONSUL_URL),
            hostname,
            name_prefix: env_or("REGISTRATOR_NAME_PREFIX", DEFAULT_NAME_PREFIX),
            settle_delay_ms: env_parsed("REGISTRATOR_SETTLE_DELAY_MS", DEFAULT_SETTLE_DELAY_MS),
            settle_retries: env_parsed("REGISTRATOR_SETTLE_RETRIES", DEFAULT_SETTLE_RETRIES),
            max_in_flight: env_parsed("REGISTRATOR_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT),
            shutdown_grace_secs: env_parsed(
                "REGISTRATOR_SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            ),
            request_timeout_secs: env_parsed(
                "REGISTRATOR_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            log_level: env_or("REGISTRATOR_LOG_LEVEL", DEFAULT_LOG_LEVEL).to_lowercase(),
            log_json: env_parsed("REGISTRATOR_LOG_JSON", false),
        }
    }
}

impl RegistratorConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_ip
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::ParseError {
                field: "NODE_IP".to_string(),
                error: format!("'{}': {}", self.node_ip, e),
            })?;

        if self.hostname.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Node hostname must not be empty".to_string(),
            ));
        }

        normalize_url(&self.consul_url).map_err(|e| ConfigError::ParseError {
            field: "CONSUL_URL".to_string(),
            error: e.to_string(),
        })?;

        if self.settle_retries > MAX_SETTLE_RETRIES {
            return Err(ConfigError::ValidationFailed(format!(
                "Settle retries must be at most {}, got {}",
                MAX_SETTLE_RETRIES, self.settle_retries
            )));
        }

        if self.max_in_flight == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max in-flight tasks must be at least 1".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be between 1 and 300 seconds".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings consumed by the reconciliation engine
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            node_address: self.node_ip.clone(),
            node_hostname: self.hostname.clone(),
            name_prefix: self.name_prefix.clone(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            settle_retries: self.settle_retries,
            max_in_flight: self.max_in_flight,
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }
}

impl fmt::Display for RegistratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Registrator Configuration:")?;
        writeln!(f, "  Node IP: {}", self.node_ip)?;
        writeln!(f, "  Hostname: {}", self.hostname)?;
        writeln!(f, "  Consul URL: {}", self.consul_url)?;
        writeln!(f, "  Name Prefix: {}", self.name_prefix)?;
        writeln!(f, "  Settle Delay: {}ms ({} retries)", self.settle_delay_ms, self.settle_retries)?;
        writeln!(f, "  Max In-Flight: {}", self.max_in_flight)?;
        writeln!(f, "  Shutdown Grace: {}s", self.shutdown_grace_secs)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
