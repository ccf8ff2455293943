//! Utility modules for the registrator

pub mod logging;
pub mod signal;

pub use logging::{init_logging, parse_level, LoggingConfig};
pub use signal::shutdown_signal;
