//! Postgres source for the ingestion pipeline.
//!
//! [`source::PostgresSource`] streams every row of one table as a JSON document, rendered by
//! the server with `row_to_json`.

pub mod query;
pub mod schema;
pub mod source;

#[cfg(feature = "test-utils")]
pub mod test_utils;
