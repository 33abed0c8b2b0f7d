use std::collections::VecDeque;

use crate::error::EtlResult;
use crate::source::Source;
use crate::types::Record;

/// In-memory source yielding a fixed list of records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: VecDeque<Record>,
}

impl MemorySource {
    /// Creates a source yielding `records` in order.
    pub fn new<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        Self {
            records: records.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of records not yet yielded.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl Source for MemorySource {
    fn name() -> &'static str {
        "memory"
    }

    async fn next_record(&mut self) -> EtlResult<Option<Record>> {
        Ok(self.records.pop_front())
    }
}
