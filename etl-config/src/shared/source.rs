use serde::Deserialize;

use crate::shared::base::require_non_empty;
use crate::shared::{PgConnectionConfig, ValidationError};

/// Configuration of the table the records are read from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Connection to the source database.
    pub connection: PgConnectionConfig,
    /// Table to scan, optionally schema-qualified (`schema.table`).
    pub table: String,
    /// Maximum number of rows to read. `None` or `0` reads the whole table.
    #[serde(default)]
    pub max_fetch_rows: Option<u64>,
}

impl SourceConfig {
    /// Validates the connection settings and the table name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate()?;
        require_non_empty("source.table", &self.table)?;

        Ok(())
    }

    /// Returns the row limit to apply to the scan, if any.
    pub fn row_limit(&self) -> Option<u64> {
        self.max_fetch_rows.filter(|limit| *limit > 0)
    }
}
