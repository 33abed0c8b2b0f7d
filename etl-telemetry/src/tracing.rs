use std::io;
use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors that can occur while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber was already installed.
    #[error("failed to install the tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builds the log filter from `RUST_LOG`, falling back to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global tracing subscriber for a binary.
///
/// Log lines go to stderr so stdout stays free for the progress line. The verbosity is
/// controlled by `RUST_LOG` and defaults to `info`.
pub fn init_tracing(app_name: &str) -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;

    tracing::debug!(app_name, "tracing initialized");

    Ok(())
}

/// Installs a test subscriber whose output is captured by the test harness.
///
/// Safe to call from every test, only the first call installs the subscriber.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_can_be_initialized_repeatedly() {
        init_test_tracing();
        init_test_tracing();

        // The test subscriber is already installed, so a second global install must fail.
        assert!(init_tracing("etl-telemetry-tests").is_err());
    }
}
