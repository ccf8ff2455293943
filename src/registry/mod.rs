//! Service registry abstraction
//!
//! [`ServiceRegistry`] is the seam between the engine and Consul. Records are
//! upserted by deterministic ID and located for removal through their
//! `container_id` metadata, so no local index of registrations is kept.

mod client;
mod consul;
mod error;
mod mock;
mod types;

pub use client::ServiceRegistry;
pub use consul::{normalize_url, ConsulRegistry};
pub use error::RegistryError;
pub use mock::{MockRegistry, RegistryCall};
pub use types::{HealthCheck, RegisteredService, RegistrationRecord, META_CONTAINER_ID, META_IMAGE};
