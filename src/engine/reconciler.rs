//! Container reconciliation
//!
//! Ties the runtime, identity resolution, endpoint extraction and the
//! registry together. Every pipeline here catches its own errors and turns
//! them into a log line and a [`ContainerOutcome`]; nothing propagates to
//! the event loop.

use super::deregistrar::{DeregistrationSummary, Deregistrar};
use super::registrar::{RegistrationSummary, Registrar};
use super::EngineSettings;
use crate::registry::ServiceRegistry;
use crate::runtime::{ContainerRuntime, ContainerSnapshot, LifecycleAction, LifecycleEvent};
use crate::service::{extract_endpoints, resolve_identity};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What happened to one container in a register pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    Registered {
        service: String,
        summary: RegistrationSummary,
    },
    /// `SERVICE_IGNORE=true` or no usable name
    Ignored,
    /// No published ports, so not a network service
    NoPorts,
    /// The container disappeared before it could be inspected
    Vanished,
    /// Inspection failed for another reason
    InspectFailed(String),
}

/// Totals for the startup scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub discovered: usize,
    pub registered_containers: usize,
    pub registered_endpoints: usize,
    pub skipped: usize,
}

pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
    registrar: Registrar,
    deregistrar: Deregistrar,
    settings: EngineSettings,
}

impl Reconciler {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<dyn ServiceRegistry>,
        settings: EngineSettings,
    ) -> Self {
        let registrar = Registrar::new(
            Arc::clone(&registry),
            settings.node_address.clone(),
            settings.node_hostname.clone(),
        );
        let deregistrar = Deregistrar::new(registry);

        Self {
            runtime,
            registrar,
            deregistrar,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Registers every running container once
    ///
    /// A listing failure leaves the registry untouched; later events fill it in.
    pub async fn bootstrap(&self) -> BootstrapSummary {
        let mut summary = BootstrapSummary::default();

        let container_ids = match self.runtime.list_running().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list running containers: {}", e);
                return summary;
            }
        };

        summary.discovered = container_ids.len();
        info!(count = summary.discovered, "Scanning running containers");

        for container_id in &container_ids {
            match self.register_container(container_id).await {
                ContainerOutcome::Registered { summary: s, .. } => {
                    summary.registered_containers += 1;
                    summary.registered_endpoints += s.registered;
                }
                _ => summary.skipped += 1,
            }
        }

        info!(
            registered = summary.registered_containers,
            endpoints = summary.registered_endpoints,
            skipped = summary.skipped,
            "Initial scan complete"
        );
        summary
    }

    /// Inspects a container once and registers it
    pub async fn register_container(&self, container_id: &str) -> ContainerOutcome {
        match self.inspect(container_id).await {
            Ok(snapshot) => self.register_snapshot(&snapshot).await,
            Err(outcome) => outcome,
        }
    }

    /// Registers a container that just started
    ///
    /// Waits for the settling delay, then re-inspects up to `settle_retries`
    /// more times while the container shows no published ports.
    pub async fn register_started(&self, container_id: &str) -> ContainerOutcome {
        let attempts = self.settings.settle_retries.saturating_add(1);

        for attempt in 1..=attempts {
            tokio::time::sleep(self.settings.settle_delay).await;

            let snapshot = match self.inspect(container_id).await {
                Ok(snapshot) => snapshot,
                Err(outcome) => return outcome,
            };

            let pending = !snapshot.has_published_ports()
                && !resolve_identity(&snapshot, &self.settings.name_prefix).ignored;

            if pending && attempt < attempts {
                trace!(container_id, attempt, "Ports not published yet, retrying");
                continue;
            }

            return self.register_snapshot(&snapshot).await;
        }

        ContainerOutcome::NoPorts
    }

    /// Removes every record owned by a container
    pub async fn deregister_container(&self, container_id: &str) -> DeregistrationSummary {
        self.deregistrar.deregister(container_id).await
    }

    /// Applies one lifecycle event to completion
    pub async fn handle_event(&self, event: &LifecycleEvent) {
        match &event.action {
            LifecycleAction::Start => {
                self.register_started(&event.container_id).await;
            }
            action if action.is_terminal() => {
                self.deregister_container(&event.container_id).await;
            }
            LifecycleAction::Other(action) => {
                trace!(container_id = %event.container_id, action = %action, "Ignoring event");
            }
            _ => {}
        }
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerSnapshot, ContainerOutcome> {
        self.runtime.inspect(container_id).await.map_err(|e| {
            if e.is_not_found() {
                debug!(container_id, "Container vanished before inspection");
                ContainerOutcome::Vanished
            } else {
                warn!(container_id, "Inspection failed: {}", e);
                ContainerOutcome::InspectFailed(e.to_string())
            }
        })
    }

    async fn register_snapshot(&self, snapshot: &ContainerSnapshot) -> ContainerOutcome {
        let container_id = snapshot.short_id();

        let descriptor = resolve_identity(snapshot, &self.settings.name_prefix);
        if descriptor.ignored {
            debug!(container_id, name = %snapshot.name, "Container ignored");
            return ContainerOutcome::Ignored;
        }

        let endpoints = extract_endpoints(&snapshot.ports);
        if endpoints.is_empty() {
            debug!(container_id, service = %descriptor.name, "No published ports");
            return ContainerOutcome::NoPorts;
        }

        let summary = self.registrar.register(&descriptor, &endpoints).await;
        ContainerOutcome::Registered {
            service: descriptor.name,
            summary,
        }
    }
}
