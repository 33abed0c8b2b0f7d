use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

/// Initializes metrics with an HTTP server exposing them for Prometheus scraping.
///
/// Installs a global metrics recorder and starts an HTTP server on `listen_address` serving the
/// scrape endpoint. Must be called from within a Tokio runtime since the exporter spawns its
/// listener on it. Installing a second recorder fails.
pub fn init_metrics(listen_address: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_address)
        .install()?;

    info!(%listen_address, "metrics exporter listening");

    Ok(())
}
