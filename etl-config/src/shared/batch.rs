use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batch processing configuration for the bulk workers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum number of records sent in one bulk call.
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,
}

impl BatchConfig {
    /// Default maximum batch size.
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    /// Upper bound for the maximum batch size.
    ///
    /// Every worker may hold one full batch and the queue one more per worker, so the bound
    /// keeps the records buffered by a run within memory.
    pub const MAX_MAX_SIZE: usize = 1_000_000;

    /// Validates batch configuration settings.
    ///
    /// Ensures max_size is non-zero and at most [`BatchConfig::MAX_MAX_SIZE`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.batch.max_size",
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.max_size > Self::MAX_MAX_SIZE {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.batch.max_size",
                constraint: format!("must be at most {}", Self::MAX_MAX_SIZE),
            });
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: default_batch_max_size(),
        }
    }
}

fn default_batch_max_size() -> usize {
    BatchConfig::DEFAULT_MAX_SIZE
}
