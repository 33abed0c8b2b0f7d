use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::types::{BulkOutcome, Record};

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    batches: usize,
    provisioned: bool,
}

/// In-memory destination for dry runs and testing.
///
/// [`MemoryDestination`] accepts every record and keeps it in memory, which makes it useful to
/// exercise a source and the pipeline without a running bulk endpoint. All data is lost when
/// the process terminates.
///
/// # Examples
///
/// ```rust,no_run
/// use etl::destination::memory::MemoryDestination;
/// use etl::pipeline::Pipeline;
/// use etl::progress::NoopProgress;
/// use etl::source::memory::MemorySource;
/// use etl_config::shared::PipelineConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let destination = MemoryDestination::new();
/// let source = MemorySource::new([r#"{"id":1}"#, r#"{"id":2}"#]);
///
/// let pipeline = Pipeline::new(PipelineConfig::default(), source, destination.clone());
/// let summary = pipeline.run(NoopProgress).await?;
///
/// assert_eq!(summary.results.succeeded, 2);
/// assert_eq!(destination.records().await.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all records written to this destination.
    ///
    /// Records of different batches appear in the order the batches were flushed.
    pub async fn records(&self) -> Vec<Record> {
        let inner = self.inner.lock().await;
        inner.records.clone()
    }

    /// Returns the number of batches written to this destination.
    pub async fn batches(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.batches
    }

    /// Returns `true` once [`Destination::provision`] has been called.
    pub async fn is_provisioned(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.provisioned
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn provision(&self) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        if !inner.provisioned {
            info!("provisioning memory destination");
            inner.provisioned = true;
        }

        Ok(())
    }

    async fn write_batch(&self, records: Vec<Record>) -> EtlResult<BulkOutcome> {
        let mut inner = self.inner.lock().await;

        debug!(batch_size = records.len(), "writing a batch of records");

        let outcome = BulkOutcome::all_succeeded(records.len());
        inner.records.extend(records);
        inner.batches += 1;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_batches_in_flush_order() {
        let destination = MemoryDestination::new();

        let outcome = destination
            .write_batch(vec![Record::from("a"), Record::from("b")])
            .await
            .unwrap();
        destination
            .write_batch(vec![Record::from("c")])
            .await
            .unwrap();

        assert_eq!(outcome, BulkOutcome::new(2, 0));
        assert_eq!(destination.batches().await, 2);
        assert_eq!(
            destination.records().await,
            vec![Record::from("a"), Record::from("b"), Record::from("c")]
        );
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let destination = MemoryDestination::new();

        destination.provision().await.unwrap();
        destination.provision().await.unwrap();

        assert!(destination.is_provisioned().await);
        assert!(destination.records().await.is_empty());
    }
}
