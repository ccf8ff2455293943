#![allow(dead_code)]

use registrator::engine::{EngineSettings, Reconciler};
use registrator::registry::MockRegistry;
use registrator::runtime::{ContainerSnapshot, HostBinding, MockRuntime};
use std::sync::Arc;
use std::time::Duration;

/// Mock runtime and registry wired into a reconciler
pub struct Harness {
    pub runtime: Arc<MockRuntime>,
    pub registry: Arc<MockRegistry>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(settings())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let runtime = Arc::new(MockRuntime::new());
        let registry = Arc::new(MockRegistry::new());
        let reconciler = Arc::new(Reconciler::new(
            runtime.clone(),
            registry.clone(),
            settings,
        ));
        Self {
            runtime,
            registry,
            reconciler,
        }
    }
}

/// Node `node1` at `10.0.0.5` with no settling delay
pub fn settings() -> EngineSettings {
    EngineSettings {
        node_address: "10.0.0.5".to_string(),
        node_hostname: "node1".to_string(),
        settle_delay: Duration::ZERO,
        settle_retries: 3,
        shutdown_grace: Duration::from_secs(1),
        ..Default::default()
    }
}

/// A container publishing a single TCP port
pub fn tcp_container(id: &str, name: &str, container_port: u16, host_port: u16) -> ContainerSnapshot {
    ContainerSnapshot::new(id, name)
        .with_image("registry.local/app:1.0")
        .with_port(
            format!("{}/tcp", container_port),
            vec![HostBinding::new("0.0.0.0", host_port.to_string())],
        )
}

pub async fn wait_until<F>(condition: F)
where
    F: Fn() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}
