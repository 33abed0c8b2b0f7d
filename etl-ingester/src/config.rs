use std::path::Path;

use etl_config::load_config_from_path;
use etl_config::shared::IngesterConfig;

use crate::error::{IngesterError, IngesterResult};

/// Loads and validates the ingester configuration.
///
/// `workers`, when given, replaces `pipeline.max_workers` before validation.
pub fn load_ingester_config(
    path: &Path,
    workers: Option<u16>,
) -> IngesterResult<IngesterConfig> {
    let mut config =
        load_config_from_path::<IngesterConfig>(path).map_err(IngesterError::config)?;

    if let Some(workers) = workers {
        config.pipeline.max_workers = workers;
    }

    config.validate().map_err(IngesterError::config)?;

    Ok(config)
}
