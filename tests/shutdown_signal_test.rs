//! Shutdown signal delivery
//!
//! Runs in its own test binary since it signals the current process.

#![cfg(unix)]

use registrator::util::shutdown_signal;
use std::process::Command;
use std::time::Duration;

#[tokio::test]
async fn test_sigterm_before_first_poll_is_delivered() {
    let shutdown = shutdown_signal();

    // signal lands while nothing is awaiting the future, as during the startup scan
    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), shutdown)
        .await
        .expect("shutdown future did not resolve after SIGTERM");
}
