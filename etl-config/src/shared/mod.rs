//! Shared configuration types for ingestion pipelines.

mod base;
mod batch;
mod connection;
mod destination;
mod ingester;
mod pipeline;
mod source;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use connection::{
    ETL_INGESTER_SOURCE_OPTIONS, IntoConnectOptions, PgConnectionConfig, PgConnectionOptions,
    TcpKeepaliveConfig,
};
pub use destination::DestinationConfig;
pub use ingester::IngesterConfig;
pub use pipeline::PipelineConfig;
pub use source::SourceConfig;
