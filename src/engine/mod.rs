//! Reconciliation and registration engine
//!
//! Two phases:
//! 1. [`Reconciler::bootstrap`] registers everything already running.
//! 2. [`EventLoop::run`] turns lifecycle events into register/deregister tasks
//!    until shutdown.
//!
//! The engine holds no registration state. IDs are deterministic and every
//! write is an upsert, so repeated or reordered events converge on the same
//! registry contents.

mod deregistrar;
mod event_loop;
mod reconciler;
mod registrar;
mod tasks;

pub use deregistrar::{DeregistrationSummary, Deregistrar};
pub use event_loop::EventLoop;
pub use reconciler::{BootstrapSummary, ContainerOutcome, Reconciler};
pub use registrar::{
    RegistrationSummary, Registrar, CHECK_INTERVAL, CHECK_TIMEOUT, DEREGISTER_CRITICAL_AFTER,
};
pub use tasks::TaskGroup;

use crate::runtime::RuntimeError;
use crate::service::DEFAULT_NAME_PREFIX;
use std::time::Duration;
use thiserror::Error;

/// Conditions that stop the event loop
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Container event stream failed: {0}")]
    EventStream(RuntimeError),

    #[error("Container event stream closed unexpectedly")]
    EventStreamClosed,
}

/// Settings for the reconciliation engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Address advertised for every endpoint
    pub node_address: String,
    /// First component of every record ID
    pub node_hostname: String,
    /// Prefix stripped from container names
    pub name_prefix: String,
    /// Wait after a start event before inspecting
    pub settle_delay: Duration,
    /// Extra inspections while ports are not yet published
    pub settle_retries: u32,
    /// Maximum concurrently executing event tasks
    pub max_in_flight: usize,
    /// Drain window on shutdown
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            node_address: "127.0.0.1".to_string(),
            node_hostname: "localhost".to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            settle_delay: Duration::from_secs(1),
            settle_retries: 3,
            max_in_flight: 64,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}
