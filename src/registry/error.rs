use thiserror::Error;

/// Errors returned by a service registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry client could not be constructed
    #[error("Invalid registry configuration: {0}")]
    Configuration(String),

    /// The request never got a response (connection refused, timeout, ...)
    #[error("Registry unreachable: {0}")]
    Transport(String),

    /// The registry answered with a non-success status
    #[error("Registry returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode registry response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::Decode(err.to_string())
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}
