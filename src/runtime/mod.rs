//! Container runtime abstraction
//!
//! The registrator observes exactly one runtime. [`ContainerRuntime`] is the
//! seam between the engine and Docker, with [`MockRuntime`] for tests.

mod client;
mod docker;
mod error;
mod mock;
mod types;

pub use client::{ContainerRuntime, EventStream};
pub use docker::DockerRuntime;
pub use error::RuntimeError;
pub use mock::{MockEventSender, MockRuntime};
pub use types::{
    short_id, ContainerSnapshot, HostBinding, LifecycleAction, LifecycleEvent, PortMap,
    SHORT_ID_LEN,
};
