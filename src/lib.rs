//! registrator - container to service-registry bridge
//!
//! Watches a container runtime and keeps a service registry in step with it:
//! every running container that publishes ports is registered once per port,
//! with a TCP health check, and removed again when it stops.
//!
//! # Core Concepts
//!
//! - **Runtime**: the source of containers and lifecycle events ([`runtime`])
//! - **Registry**: the sink for service records ([`registry`])
//! - **Identity**: how a container's name, environment and ports become a
//!   service name and endpoints ([`service`])
//! - **Engine**: startup scan plus the event loop ([`engine`])
//!
//! The engine keeps no registration state. Record IDs are
//! `hostname-service-port`, every write is an upsert, and records are found
//! for removal through their `container_id` metadata.
//!
//! # Example Usage
//!
//! ```no_run
//! use registrator::engine::{EventLoop, Reconciler};
//! use registrator::registry::ConsulRegistry;
//! use registrator::runtime::{ContainerRuntime, DockerRuntime};
//! use registrator::RegistratorConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistratorConfig::default();
//! let runtime = Arc::new(DockerRuntime::connect()?);
//! let registry = Arc::new(ConsulRegistry::new(&config.consul_url, config.request_timeout())?);
//!
//! let reconciler = Arc::new(Reconciler::new(runtime.clone(), registry, config.engine_settings()));
//! reconciler.bootstrap().await;
//!
//! EventLoop::new(reconciler)
//!     .run(runtime.events(), async { let _ = tokio::signal::ctrl_c().await; })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod util;

pub use config::{ConfigError, RegistratorConfig};
pub use engine::{EngineError, EngineSettings, EventLoop, Reconciler};
pub use registry::{ConsulRegistry, RegistrationRecord, RegistryError, ServiceRegistry};
pub use runtime::{ContainerRuntime, ContainerSnapshot, DockerRuntime, RuntimeError};
pub use service::{Endpoint, ServiceDescriptor};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
