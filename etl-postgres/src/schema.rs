use std::fmt;

use etl::bail;
use etl::error::{ErrorKind, EtlResult};
use pg_escape::quote_identifier;

/// Possibly schema-qualified Postgres table name.
///
/// Without a schema, the table is resolved through the `search_path` of the connection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableName {
    /// The schema containing the table, if given explicitly.
    pub schema: Option<String>,
    /// The name of the table.
    pub name: String,
}

impl TableName {
    /// Creates a new [`TableName`].
    pub fn new(schema: Option<String>, name: String) -> TableName {
        Self { schema, name }
    }

    /// Parses `table` or `schema.table`.
    ///
    /// The input is taken literally, quotes are not interpreted. More than one dot or an empty
    /// component is rejected.
    pub fn parse(value: &str) -> EtlResult<TableName> {
        let mut parts = value.split('.');

        let (schema, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => (None, name),
            (Some(schema), Some(name), None) => (Some(schema), name),
            _ => bail!(
                ErrorKind::ConfigError,
                "Invalid table name",
                format!("Table name `{value}` has more than one schema separator")
            ),
        };

        if name.trim().is_empty() || schema.is_some_and(|schema| schema.trim().is_empty()) {
            bail!(
                ErrorKind::ConfigError,
                "Invalid table name",
                format!("Table name `{value}` has an empty component")
            );
        }

        Ok(TableName::new(schema.map(str::to_string), name.to_string()))
    }

    /// Returns the table name as a properly quoted Postgres identifier.
    ///
    /// Escapes both schema and table names according to Postgres identifier
    /// quoting rules to handle special characters and reserved keywords safely.
    pub fn as_quoted_identifier(&self) -> String {
        let quoted_name = quote_identifier(&self.name);

        match &self.schema {
            Some(schema) => format!("{}.{quoted_name}", quote_identifier(schema)),
            None => quoted_name.into_owned(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
