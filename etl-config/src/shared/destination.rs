use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;
use crate::shared::base::require_non_empty;

const fn default_request_timeout_ms() -> u64 {
    DestinationConfig::DEFAULT_REQUEST_TIMEOUT_MS
}

/// Configuration for supported destinations.
///
/// Specifies the destination type and its associated configuration parameters.
/// Each variant corresponds to a different supported destination system.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Keeps every record in memory. Useful to dry-run a source.
    Memory,
    /// Elasticsearch destination configuration.
    Elasticsearch {
        /// Base URL of the cluster, for example `http://localhost:9200`.
        url: String,
        /// Index the documents are created in.
        index: String,
        /// Mapping bodies applied to the index, in order, before ingestion starts.
        #[serde(default)]
        mappings: Vec<serde_json::Value>,
        /// Username for basic authentication.
        #[serde(default)]
        username: Option<String>,
        /// Password for basic authentication.
        #[serde(default)]
        password: Option<SecretString>,
        /// Timeout for a single HTTP request, bulk calls included.
        #[serde(default = "default_request_timeout_ms")]
        request_timeout_ms: u64,
    },
}

impl DestinationConfig {
    /// Default timeout for a single HTTP request to the destination.
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

    /// Validates that every field needed to reach the destination is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DestinationConfig::Memory => Ok(()),
            DestinationConfig::Elasticsearch {
                url,
                index,
                request_timeout_ms,
                ..
            } => {
                require_non_empty("destination.elasticsearch.index", index)?;
                require_non_empty("destination.elasticsearch.url", url)?;

                if *request_timeout_ms == 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "destination.elasticsearch.request_timeout_ms",
                        constraint: "must be greater than 0".to_string(),
                    });
                }

                Ok(())
            }
        }
    }
}
