//! Shared helpers for chisel's integration tests.

pub mod builders;
pub mod fake_compiler;
pub mod scripted_source;

use std::future::Future;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness's capture.
///
/// Only failing tests show logs (unless run with `--nocapture`). `RUST_LOG`
/// overrides the default `chisel=debug`. Safe to call from every test.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chisel=debug"));
    // A second call in the same binary finds the subscriber already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Await `f`, failing the test after 5 seconds.
///
/// Under `start_paused` the clock auto-advances, so this bounds simulated
/// time rather than wall time.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("test timed out after 5 seconds")
}
