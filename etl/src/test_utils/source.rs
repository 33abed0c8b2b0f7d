use std::collections::VecDeque;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::source::Source;
use crate::types::Record;

/// Source that yields its records and then fails instead of ending.
///
/// Models a connection lost in the middle of a scan. After the failure the source reports
/// exhaustion, so a caller that keeps polling does not loop forever.
#[derive(Debug)]
pub struct FailingSource {
    records: VecDeque<Record>,
    failed: bool,
}

impl FailingSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
            failed: false,
        }
    }
}

impl Source for FailingSource {
    fn name() -> &'static str {
        "failing"
    }

    async fn next_record(&mut self) -> EtlResult<Option<Record>> {
        if self.failed {
            return Ok(None);
        }

        if let Some(record) = self.records.pop_front() {
            return Ok(Some(record));
        }

        self.failed = true;

        Err(etl_error!(
            ErrorKind::SourceIoError,
            "Source read failed",
            "The connection was reset while streaming rows"
        ))
    }
}
