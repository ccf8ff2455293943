use thiserror::Error;

/// Errors returned by a container runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime client could not be constructed
    #[error("Failed to connect to container runtime: {0}")]
    Connection(String),

    /// The container no longer exists (removed between event and inspection)
    #[error("Container not found: {0}")]
    NotFound(String),

    /// The runtime rejected or failed a request
    #[error("Container runtime request failed: {0}")]
    Request(String),

    /// The event subscription reported an error
    #[error("Event stream error: {0}")]
    EventStream(String),
}

impl RuntimeError {
    /// True when the error means the container is gone, which callers treat as a skip
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}
