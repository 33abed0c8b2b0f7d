use std::time::Duration;

use etl::destination::Destination;
use etl::destination::memory::MemoryDestination;
use etl::pipeline::{IngestSummary, Pipeline};
use etl::progress::TerminalProgress;
use etl_config::shared::{DestinationConfig, IngesterConfig, PipelineConfig, SourceConfig};
use etl_destinations::elasticsearch::ElasticsearchDestination;
use etl_postgres::source::PostgresSource;
use tracing::info;

use crate::error::IngesterResult;

/// Runs one ingestion with the provided configuration.
///
/// Provisions the destination, connects the source and runs the pipeline to completion while
/// the progress line is printed on stdout.
pub async fn start_ingester_with_config(config: IngesterConfig) -> IngesterResult<IngestSummary> {
    info!("starting ingester");

    log_config(&config);

    // Each destination gets its own pipeline type. This is more verbose due to static dispatch,
    // but keeps the bulk path free of dynamic calls.
    let summary = match &config.destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            run_ingestion(&config.source, config.pipeline, destination).await?
        }
        DestinationConfig::Elasticsearch {
            url,
            index,
            mappings,
            username,
            password,
            request_timeout_ms,
        } => {
            let destination = ElasticsearchDestination::new(
                url,
                index.clone(),
                mappings.clone(),
                username.clone(),
                password.clone(),
                Duration::from_millis(*request_timeout_ms),
            )?;
            run_ingestion(&config.source, config.pipeline, destination).await?
        }
    };

    info!(
        enqueued = summary.enqueued,
        succeeded = summary.results.succeeded,
        failed = summary.results.failed,
        batches = summary.batches(),
        "ingester finished"
    );

    Ok(summary)
}

async fn run_ingestion<D>(
    source_config: &SourceConfig,
    pipeline_config: PipelineConfig,
    destination: D,
) -> IngesterResult<IngestSummary>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    destination.provision().await?;

    let source = PostgresSource::connect(source_config).await?;

    let pipeline = Pipeline::new(pipeline_config, source, destination);
    let summary = pipeline.run(TerminalProgress::new()).await?;

    Ok(summary)
}

fn log_config(config: &IngesterConfig) {
    let source = &config.source;
    info!(
        host = %source.connection.host,
        port = source.connection.port,
        database = %source.connection.name,
        username = %source.connection.username,
        table = %source.table,
        max_fetch_rows = source.row_limit(),
        "source config"
    );

    match &config.destination {
        DestinationConfig::Memory => info!("memory destination config"),
        DestinationConfig::Elasticsearch {
            url,
            index,
            mappings,
            username,
            request_timeout_ms,
            ..
        } => info!(
            url = %url,
            index = %index,
            mappings = mappings.len(),
            username = username.as_deref(),
            request_timeout_ms,
            "elasticsearch destination config"
        ),
    }

    info!(
        max_batch_size = config.pipeline.batch.max_size,
        max_workers = config.pipeline.max_workers,
        "pipeline config"
    );
}
