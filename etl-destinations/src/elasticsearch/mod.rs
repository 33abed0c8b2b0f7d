pub mod bulk;
pub mod client;
mod core;
mod metrics;

pub use client::ElasticsearchClient;
pub use core::ElasticsearchDestination;
