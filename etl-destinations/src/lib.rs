//! Destination implementations for the ingestion pipeline.
//!
//! Provides implementations of the [`etl::destination::Destination`] trait for search and
//! analytics stores reached over HTTP.

pub mod elasticsearch;
