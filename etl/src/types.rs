//! Core data types flowing through the ingestion pipeline.

use std::fmt;

/// One serialized, self-contained document produced by a [`crate::source::Source`].
///
/// The payload is opaque to the pipeline: it is never parsed or modified, only moved from the
/// source into exactly one batch.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    payload: String,
}

impl Record {
    /// Creates a new [`Record`] from a serialized payload.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns the serialized payload.
    pub fn as_str(&self) -> &str {
        &self.payload
    }

    /// Returns the size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consumes the record and returns the payload.
    pub fn into_inner(self) -> String {
        self.payload
    }
}

impl From<String> for Record {
    fn from(payload: String) -> Self {
        Self::new(payload)
    }
}

impl From<&str> for Record {
    fn from(payload: &str) -> Self {
        Self::new(payload)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("len", &self.payload.len())
            .finish()
    }
}

/// Per-record result of one bulk flush.
///
/// Each record of a batch succeeds or fails independently, a rejected record never fails the
/// whole batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Number of records the destination accepted.
    pub succeeded: u64,
    /// Number of records the destination rejected.
    pub failed: u64,
}

impl BulkOutcome {
    /// Creates a new [`BulkOutcome`].
    pub fn new(succeeded: u64, failed: u64) -> Self {
        Self { succeeded, failed }
    }

    /// Outcome of a batch where every record was accepted.
    pub fn all_succeeded(records: usize) -> Self {
        Self::new(records as u64, 0)
    }

    /// Outcome of a batch where every record was lost or rejected.
    pub fn all_failed(records: usize) -> Self {
        Self::new(0, records as u64)
    }

    /// Returns the number of records accounted for by this outcome.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Makes the outcome account for exactly `batch_len` records.
    ///
    /// Records the destination did not report on are counted as failed, and a destination that
    /// reports more records than it was sent is capped to the batch size.
    pub fn reconcile(self, batch_len: usize) -> Self {
        let batch_len = batch_len as u64;
        let succeeded = self.succeeded.min(batch_len);
        let failed = batch_len - succeeded;

        Self { succeeded, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_counts_missing_items_as_failed() {
        let outcome = BulkOutcome::new(7, 1).reconcile(10);

        assert_eq!(outcome, BulkOutcome::new(7, 3));
    }

    #[test]
    fn reconcile_caps_over_reported_outcomes() {
        let outcome = BulkOutcome::new(12, 3).reconcile(10);

        assert_eq!(outcome, BulkOutcome::new(10, 0));
    }

    #[test]
    fn reconcile_keeps_exact_outcomes() {
        let outcome = BulkOutcome::new(900, 100).reconcile(1000);

        assert_eq!(outcome, BulkOutcome::new(900, 100));
        assert_eq!(outcome.total(), 1000);
    }

    #[test]
    fn debug_does_not_print_payload() {
        let record = Record::new(r#"{"secret":"value"}"#);

        assert_eq!(format!("{record:?}"), "Record { len: 18 }");
    }
}
