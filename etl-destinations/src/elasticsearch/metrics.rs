use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Label for the Elasticsearch error type of a rejected item.
pub const ERROR_TYPE_LABEL: &str = "error_type";

/// Documents rejected individually inside an otherwise successful bulk request.
/// Labels: `error_type`.
pub const ETL_ES_REJECTED_DOCUMENTS_TOTAL: &str = "etl_es_rejected_documents_total";

/// Duration of index provisioning, from the existence check to the last mapping update.
pub const ETL_ES_PROVISION_DURATION_SECONDS: &str = "etl_es_provision_duration_seconds";

/// Register Elasticsearch-specific metrics.
///
/// Safe to call multiple times, registration happens only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            ETL_ES_REJECTED_DOCUMENTS_TOTAL,
            Unit::Count,
            "Documents rejected individually by Elasticsearch inside a bulk request, labeled by error_type"
        );

        describe_histogram!(
            ETL_ES_PROVISION_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of Elasticsearch index provisioning including mapping updates"
        );
    });
}
