use serde::Deserialize;
use std::net::SocketAddr;

use crate::Config;
use crate::shared::{DestinationConfig, PipelineConfig, SourceConfig, ValidationError};

/// Top-level configuration of the ingester binary.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally leaking
/// secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct IngesterConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Address of the Prometheus scrape endpoint. Metrics are not exported when unset.
    #[serde(default)]
    pub metrics_listen_address: Option<SocketAddr>,
}

impl IngesterConfig {
    /// Validates the whole configuration, destination first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.destination.validate()?;
        self.source.validate()?;
        self.pipeline.validate()?;

        Ok(())
    }
}

impl Config for IngesterConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
