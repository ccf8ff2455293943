//! Container runtime types
//!
//! These types describe what the registrator needs to know about a container,
//! independent of the runtime implementation that produced them.

use std::collections::HashMap;
use std::fmt;

/// Length of the short container ID used in registry metadata
pub const SHORT_ID_LEN: usize = 12;

/// Returns the short (12 character) form of a container ID
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// A single host-side binding of a published container port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBinding {
    /// Host interface the port is bound on (may be empty)
    pub host_ip: String,
    /// Host port as reported by the runtime (unparsed)
    pub host_port: String,
}

impl HostBinding {
    pub fn new(host_ip: impl Into<String>, host_port: impl Into<String>) -> Self {
        Self {
            host_ip: host_ip.into(),
            host_port: host_port.into(),
        }
    }
}

/// Published port map keyed by `<port>/<protocol>` (e.g. `8080/tcp`)
pub type PortMap = HashMap<String, Vec<HostBinding>>;

/// Point-in-time view of a container as returned by inspection
///
/// Never cached: a fresh snapshot is fetched for every processing step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// Full container ID
    pub id: String,
    /// Raw container name, usually with a leading `/`
    pub name: String,
    /// Raw environment entries in `KEY=VALUE` form
    pub env: Vec<String>,
    /// Published port bindings
    pub ports: PortMap,
    /// Image reference the container was created from
    pub image: String,
}

impl ContainerSnapshot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_port(mut self, key: impl Into<String>, bindings: Vec<HostBinding>) -> Self {
        self.ports.insert(key.into(), bindings);
        self
    }

    /// True when at least one container port has a host binding
    pub fn has_published_ports(&self) -> bool {
        self.ports.values().any(|bindings| !bindings.is_empty())
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Lifecycle transitions the registrator reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Die,
    Stop,
    /// Any other action; ignored by the engine
    Other(String),
}

impl LifecycleAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "start" => LifecycleAction::Start,
            "die" => LifecycleAction::Die,
            "stop" => LifecycleAction::Stop,
            other => LifecycleAction::Other(other.to_string()),
        }
    }

    /// True for transitions into a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleAction::Die | LifecycleAction::Stop)
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Start => write!(f, "start"),
            LifecycleAction::Die => write!(f, "die"),
            LifecycleAction::Stop => write!(f, "stop"),
            LifecycleAction::Other(action) => write!(f, "{}", action),
        }
    }
}

/// A container lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub action: LifecycleAction,
    pub container_id: String,
}

impl LifecycleEvent {
    pub fn new(action: LifecycleAction, container_id: impl Into<String>) -> Self {
        Self {
            action,
            container_id: container_id.into(),
        }
    }

    pub fn start(container_id: impl Into<String>) -> Self {
        Self::new(LifecycleAction::Start, container_id)
    }

    pub fn die(container_id: impl Into<String>) -> Self {
        Self::new(LifecycleAction::Die, container_id)
    }

    pub fn stop(container_id: impl Into<String>) -> Self {
        Self::new(LifecycleAction::Stop, container_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef0123"), "0123456789ab");
    }

    #[test]
    fn test_short_id_keeps_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn test_has_published_ports() {
        let snapshot = ContainerSnapshot::new("id", "/name");
        assert!(!snapshot.has_published_ports());

        let snapshot = snapshot.with_port("80/tcp", vec![]);
        assert!(!snapshot.has_published_ports());

        let snapshot = snapshot.with_port("81/tcp", vec![HostBinding::new("0.0.0.0", "8081")]);
        assert!(snapshot.has_published_ports());
    }

    #[test]
    fn test_lifecycle_action_parse() {
        assert_eq!(LifecycleAction::parse("start"), LifecycleAction::Start);
        assert_eq!(LifecycleAction::parse("die"), LifecycleAction::Die);
        assert_eq!(LifecycleAction::parse("stop"), LifecycleAction::Stop);
        assert_eq!(
            LifecycleAction::parse("pause"),
            LifecycleAction::Other("pause".to_string())
        );
    }

    #[test]
    fn test_terminal_actions() {
        assert!(LifecycleAction::Die.is_terminal());
        assert!(LifecycleAction::Stop.is_terminal());
        assert!(!LifecycleAction::Start.is_terminal());
        assert!(!LifecycleAction::Other("kill".into()).is_terminal());
    }
}
