use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, ValidationError};

/// Configuration of the ingestion pipeline core.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Batch processing configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Number of bulk workers draining the queue concurrently.
    ///
    /// This is also the maximum number of bulk calls in flight at any time.
    #[serde(default = "default_max_workers")]
    pub max_workers: u16,
}

impl PipelineConfig {
    /// Default number of bulk workers.
    pub const DEFAULT_MAX_WORKERS: u16 = 1;

    /// Validates pipeline configuration settings.
    ///
    /// Ensures the batch size and the worker count are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.batch.validate()?;

        if self.max_workers == 0 {
            return Err(ValidationError::MaxWorkersZero);
        }

        Ok(())
    }

    /// Returns the capacity of the queue between the producer and the workers.
    ///
    /// The queue holds one full batch per worker. Returns `None` on overflow.
    pub fn queue_capacity(&self) -> Option<usize> {
        self.batch.max_size.checked_mul(usize::from(self.max_workers))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> u16 {
    PipelineConfig::DEFAULT_MAX_WORKERS
}
