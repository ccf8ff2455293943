//! Endpoint extraction from published port bindings

use crate::runtime::PortMap;
use std::fmt;
use tracing::debug;

/// Transport protocol of a published port
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            "sctp" => Some(Protocol::Sctp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published port reachable from outside the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Endpoint {
    pub container_port: u16,
    pub protocol: Protocol,
    /// Host-side port; `0` when the runtime reported something unparsable
    pub host_port: u16,
}

impl Endpoint {
    /// False for endpoints that must not be registered
    pub fn is_routable(&self) -> bool {
        self.host_port != 0
    }
}

/// Splits a port key such as `8080/tcp`; a key without protocol means tcp
fn parse_port_key(key: &str) -> Option<(u16, Protocol)> {
    let (port, protocol) = match key.split_once('/') {
        Some((port, proto)) => (port, Protocol::parse(proto)?),
        None => (key, Protocol::Tcp),
    };
    Some((port.trim().parse().ok()?, protocol))
}

/// Extracts one endpoint per bound container port
///
/// Only the first host binding of each container port is used. Unparsable
/// host ports become `0`. The result is sorted by container port.
pub fn extract_endpoints(ports: &PortMap) -> Vec<Endpoint> {
    let mut endpoints: Vec<Endpoint> = ports
        .iter()
        .filter_map(|(key, bindings)| {
            let binding = bindings.first()?;
            let Some((container_port, protocol)) = parse_port_key(key) else {
                debug!(port_key = %key, "Skipping unrecognized port key");
                return None;
            };
            let host_port = binding.host_port.trim().parse::<u16>().unwrap_or(0);
            Some(Endpoint {
                container_port,
                protocol,
                host_port,
            })
        })
        .collect();

    endpoints.sort();
    endpoints
}
