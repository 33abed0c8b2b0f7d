//! Encoding of bulk requests and decoding of bulk responses.
//!
//! A bulk request is an NDJSON body where every document is preceded by its action line. The
//! response reports one item per action, in request order.

use std::borrow::Cow;
use std::collections::HashMap;

use etl::types::{BulkOutcome, Record};
use metrics::counter;
use serde::Deserialize;
use tracing::debug;

use crate::elasticsearch::metrics::{ERROR_TYPE_LABEL, ETL_ES_REJECTED_DOCUMENTS_TOTAL};

/// Response body of the `_bulk` endpoint.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    /// Whether at least one item failed.
    #[serde(default)]
    pub errors: bool,
    /// One entry per action, keyed by the action name (`create`, `index`, ...).
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

/// Result of a single bulk action.
#[derive(Debug, Deserialize)]
pub struct BulkItem {
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Reason a bulk action was rejected.
#[derive(Debug, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BulkItem {
    /// Returns `true` if the document was written.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.error.is_none()
    }
}

/// Error type reported for documents rejected before they are sent.
const INVALID_DOCUMENT_ERROR_TYPE: &str = "invalid_document";

/// NDJSON body of one bulk request.
#[derive(Debug, Default)]
pub struct BulkBody {
    /// The encoded body, ending with a newline.
    pub body: String,
    /// Number of documents in the body.
    pub documents: usize,
    /// Number of records left out of the body because they cannot be framed.
    pub rejected: u64,
}

/// Builds the NDJSON body creating every record in `index`.
///
/// Documents spanning several lines are compacted first, since a newline ends a document in
/// the bulk format. A multi-line record that is not valid JSON cannot be compacted: it is left
/// out of the body and counted in [`BulkBody::rejected`]. Single-line records are sent as they
/// are and rejected by the server if invalid.
pub fn encode_bulk_body(index: &str, records: &[Record]) -> BulkBody {
    let action = serde_json::json!({ "create": { "_index": index } }).to_string();

    let capacity = records
        .iter()
        .map(|record| action.len() + record.len() + 2)
        .sum();
    let mut encoded = BulkBody {
        body: String::with_capacity(capacity),
        ..BulkBody::default()
    };

    for record in records {
        let Some(document) = single_line_document(record) else {
            debug!(
                error_type = INVALID_DOCUMENT_ERROR_TYPE,
                document_len = record.len(),
                "multi-line record is not valid json, skipping it"
            );
            counter!(
                ETL_ES_REJECTED_DOCUMENTS_TOTAL,
                ERROR_TYPE_LABEL => INVALID_DOCUMENT_ERROR_TYPE
            )
            .increment(1);
            encoded.rejected += 1;
            continue;
        };

        encoded.body.push_str(&action);
        encoded.body.push('\n');
        encoded.body.push_str(&document);
        encoded.body.push('\n');
        encoded.documents += 1;
    }

    encoded
}

/// Returns the document of `record` on a single line, or `None` if it cannot be compacted.
fn single_line_document(record: &Record) -> Option<Cow<'_, str>> {
    let document = record.as_str();
    if !document.contains(['\n', '\r']) {
        return Some(document.into());
    }

    serde_json::from_str::<serde_json::Value>(document)
        .ok()
        .map(|value| value.to_string().into())
}

/// Counts the written and rejected documents of a bulk response.
///
/// Every rejection is logged with its reason. The caller reconciles the outcome against the
/// batch size, so items missing from the response count as failed.
pub fn summarize_response(response: &BulkResponse) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();

    for item in response.items.iter().flat_map(|action| action.values()) {
        if item.is_success() {
            outcome.succeeded += 1;
            continue;
        }

        outcome.failed += 1;

        let error_type = item
            .error
            .as_ref()
            .map(|error| error.error_type.clone())
            .unwrap_or_else(|| "unknown".to_string());
        debug!(
            status = item.status,
            error_type = %error_type,
            reason = item.error.as_ref().and_then(|error| error.reason.as_deref()),
            "document rejected by elasticsearch"
        );
        counter!(ETL_ES_REJECTED_DOCUMENTS_TOTAL, ERROR_TYPE_LABEL => error_type).increment(1);
    }

    outcome
}
