//! Configuration types and loading for the ingestion pipeline.
//!
//! [`shared`] holds the serde types describing the source, the destination and the pipeline.
//! [`load`] merges a configuration file with `APP_`-prefixed environment overrides.

pub mod load;
pub mod shared;

pub use load::{Config, LoadConfigError, load_config_from_path};
