use std::sync::Arc;
use std::time::{Duration, Instant};

use etl::destination::Destination;
use etl::error::EtlResult;
use etl::types::{BulkOutcome, Record};
use metrics::histogram;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::elasticsearch::bulk::{encode_bulk_body, summarize_response};
use crate::elasticsearch::client::ElasticsearchClient;
use crate::elasticsearch::metrics::{ETL_ES_PROVISION_DURATION_SECONDS, register_metrics};

/// Destination creating every record as a document of one Elasticsearch index.
///
/// Each batch is sent as a single `_bulk` request of `create` actions. Documents rejected by
/// the cluster are counted as failed without failing the batch.
#[derive(Debug, Clone)]
pub struct ElasticsearchDestination {
    client: ElasticsearchClient,
    index: String,
    mappings: Arc<Vec<serde_json::Value>>,
}

impl ElasticsearchDestination {
    /// Creates a destination writing into `index` of the cluster at `url`.
    ///
    /// `mappings` are applied in order by [`Destination::provision`].
    pub fn new(
        url: &str,
        index: impl Into<String>,
        mappings: Vec<serde_json::Value>,
        username: Option<String>,
        password: Option<SecretString>,
        request_timeout: Duration,
    ) -> EtlResult<Self> {
        register_metrics();

        let client = ElasticsearchClient::new(url, username, password, request_timeout)?;

        Ok(Self {
            client,
            index: index.into(),
            mappings: Arc::new(mappings),
        })
    }

    /// Returns the index documents are written to.
    pub fn index(&self) -> &str {
        &self.index
    }
}

impl Destination for ElasticsearchDestination {
    fn name() -> &'static str {
        "elasticsearch"
    }

    async fn provision(&self) -> EtlResult<()> {
        let started = Instant::now();

        if self.client.index_exists(&self.index).await? {
            debug!(index = %self.index, "elasticsearch index already exists");
        } else {
            self.client.create_index(&self.index).await?;
        }

        for mapping in self.mappings.iter() {
            self.client.put_mapping(&self.index, mapping).await?;
        }

        histogram!(ETL_ES_PROVISION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        info!(
            index = %self.index,
            mappings = self.mappings.len(),
            "elasticsearch index provisioned"
        );

        Ok(())
    }

    async fn write_batch(&self, records: Vec<Record>) -> EtlResult<BulkOutcome> {
        if records.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let encoded = encode_bulk_body(&self.index, &records);
        if encoded.documents == 0 {
            return Ok(BulkOutcome::all_failed(records.len()));
        }

        let response = self.client.bulk(encoded.body).await?;

        let mut outcome = summarize_response(&response);
        outcome.failed += encoded.rejected;

        Ok(outcome)
    }
}
