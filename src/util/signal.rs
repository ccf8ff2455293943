//! Process shutdown signals
//!
//! Handlers are installed when [`shutdown_signal`] is called, not when the
//! returned future is first polled, so a signal that arrives while the startup
//! scan runs is still delivered to the event loop.

use std::future::Future;
use tracing::warn;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Installs SIGINT and SIGTERM handlers and resolves once either fires
///
/// Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    let mut interrupt = install(SignalKind::interrupt(), "SIGINT");
    let mut terminate = install(SignalKind::terminate(), "SIGTERM");

    async move {
        tokio::select! {
            _ = recv(&mut interrupt) => {}
            _ = recv(&mut terminate) => {}
        }
    }
}

/// Resolves on ctrl-c
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
fn install(kind: SignalKind, label: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("Failed to listen for {}: {}", label, e);
            None
        }
    }
}

/// Waits for the next delivery; never resolves without a handler
#[cfg(unix)]
async fn recv(stream: &mut Option<Signal>) {
    match stream {
        Some(stream) => {
            stream.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
