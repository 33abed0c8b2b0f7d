//! Metrics definitions for ingestion pipeline monitoring.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Label for destination name in metrics.
pub const DESTINATION_LABEL: &str = "destination";

/// Counter for records the destination accepted.
pub const ETL_RECORDS_SUCCEEDED_TOTAL: &str = "etl_records_succeeded_total";

/// Counter for records the destination rejected or that were lost with their batch.
pub const ETL_RECORDS_FAILED_TOTAL: &str = "etl_records_failed_total";

/// Counter for flushed batches, regardless of their outcome.
pub const ETL_BATCHES_FLUSHED_TOTAL: &str = "etl_batches_flushed_total";

/// Counter for batches whose bulk call failed at the transport level.
pub const ETL_BATCHES_FAILED_TOTAL: &str = "etl_batches_failed_total";

/// Duration of one bulk call, from request to response.
pub const ETL_BATCH_SEND_DURATION_SECONDS: &str = "etl_batch_send_duration_seconds";

/// Registers the pipeline metrics descriptions.
///
/// Safe to call multiple times, registration happens only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            ETL_RECORDS_SUCCEEDED_TOTAL,
            Unit::Count,
            "Total number of records accepted by the destination, labeled by destination"
        );

        describe_counter!(
            ETL_RECORDS_FAILED_TOTAL,
            Unit::Count,
            "Total number of records rejected by the destination or lost with a failed batch, labeled by destination"
        );

        describe_counter!(
            ETL_BATCHES_FLUSHED_TOTAL,
            Unit::Count,
            "Total number of batches flushed by the bulk workers, labeled by destination"
        );

        describe_counter!(
            ETL_BATCHES_FAILED_TOTAL,
            Unit::Count,
            "Total number of batches whose bulk call failed at the transport level, labeled by destination"
        );

        describe_histogram!(
            ETL_BATCH_SEND_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of a single bulk call against the destination, labeled by destination"
        );
    });
}
