//! Docker runtime backed by the bollard client
//!
//! Connects with `Docker::connect_with_local_defaults()`, which honours
//! `DOCKER_HOST` and otherwise uses the local unix socket.

use super::client::{ContainerRuntime, EventStream};
use super::error::RuntimeError;
use super::types::{ContainerSnapshot, HostBinding, LifecycleAction, LifecycleEvent, PortMap};
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerInspectResponse, EventMessage};
use bollard::system::EventsOptions;
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Event actions the registrator subscribes to
const SUBSCRIBED_ACTIONS: &[&str] = &["start", "die", "stop"];

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Builds a client from the local environment
    ///
    /// This does not contact the daemon; connection problems show up on the first call.
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        debug!("Docker client created");
        Ok(Self { docker })
    }

    /// Reports the daemon API version; used as a startup probe
    pub async fn api_version(&self) -> Result<String, RuntimeError> {
        let version = self.docker.version().await.map_err(map_error)?;
        Ok(version.api_version.unwrap_or_else(|| "unknown".to_string()))
    }

    fn event_filters() -> HashMap<String, Vec<String>> {
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        filters.insert(
            "event".to_string(),
            SUBSCRIBED_ACTIONS.iter().map(|a| a.to_string()).collect(),
        );
        filters
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> Result<Vec<String>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(map_error)?;

        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        let response = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| match e {
                BollardError::DockerResponseServerError {
                    status_code: 404, ..
                } => RuntimeError::NotFound(container_id.to_string()),
                other => map_error(other),
            })?;

        Ok(snapshot_from_inspect(container_id, response))
    }

    fn events(&self) -> EventStream {
        let options = EventsOptions::<String> {
            filters: Self::event_filters(),
            ..Default::default()
        };

        self.docker
            .events(Some(options))
            .filter_map(|item| async move {
                match item {
                    Ok(message) => event_from_message(message).map(Ok),
                    Err(e) => Some(Err(RuntimeError::EventStream(e.to_string()))),
                }
            })
            .boxed()
    }

    fn name(&self) -> &str {
        "docker"
    }
}

fn map_error(err: BollardError) -> RuntimeError {
    RuntimeError::Request(err.to_string())
}

fn event_from_message(message: EventMessage) -> Option<LifecycleEvent> {
    let action = message.action?;
    let container_id = message.actor.and_then(|actor| actor.id)?;
    trace!(action = %action, container_id = %container_id, "Docker event");
    Some(LifecycleEvent::new(
        LifecycleAction::parse(&action),
        container_id,
    ))
}

fn snapshot_from_inspect(requested_id: &str, response: ContainerInspectResponse) -> ContainerSnapshot {
    let (env, image) = match response.config {
        Some(config) => (config.env.unwrap_or_default(), config.image.unwrap_or_default()),
        None => (Vec::new(), String::new()),
    };

    let ports: PortMap = response
        .network_settings
        .and_then(|settings| settings.ports)
        .unwrap_or_default()
        .into_iter()
        .map(|(key, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .map(|b| HostBinding {
                    host_ip: b.host_ip.unwrap_or_default(),
                    host_port: b.host_port.unwrap_or_default(),
                })
                .collect();
            (key, bindings)
        })
        .collect();

    ContainerSnapshot {
        id: response.id.unwrap_or_else(|| requested_id.to_string()),
        name: response.name.unwrap_or_default(),
        env,
        ports,
        image,
    }
}
