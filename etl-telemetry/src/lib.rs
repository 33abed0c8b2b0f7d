//! Logging and metrics setup shared by the ingestion binaries and tests.

pub mod metrics;
pub mod tracing;
