//! Derivation of registry identities from container metadata

pub mod endpoint;
pub mod identity;

pub use endpoint::{extract_endpoints, Endpoint, Protocol};
pub use identity::{parse_env, resolve_identity, ServiceDescriptor, DEFAULT_NAME_PREFIX};
