use std::pin::Pin;

use etl::error::{ErrorKind, EtlResult};
use etl::etl_error;
use etl::source::Source;
use etl::types::Record;
use etl_config::shared::{ETL_INGESTER_SOURCE_OPTIONS, IntoConnectOptions, SourceConfig};
use futures::StreamExt;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, Connection, NoTls, RowStream, Socket};
use tracing::{Instrument, debug, error, info};

use crate::query::build_select_query;
use crate::schema::TableName;

/// Spawns a background task to monitor a Postgres connection until it terminates.
///
/// The task logs when the connection closes, either gracefully or with an error.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        let result = connection.await;

        match result {
            Err(err) => error!("an error occurred during the postgres connection: {}", err),
            Ok(()) => info!("postgres connection terminated successfully"),
        }
    }
    .instrument(span);

    // There is no need to track the connection task via the `JoinHandle` since the `Client`, which
    // returned the connection, will automatically terminate the connection when dropped.
    tokio::spawn(task);
}

/// Source streaming the rows of one Postgres table as JSON documents.
///
/// Rows are pulled from the server lazily while the pipeline consumes them, so memory use does
/// not depend on the table size.
pub struct PostgresSource {
    // Kept alive for the duration of the scan, dropping it terminates the connection.
    _client: Client,
    rows: Pin<Box<RowStream>>,
    table: TableName,
    rows_read: u64,
}

impl std::fmt::Debug for PostgresSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSource")
            .field("table", &self.table)
            .field("rows_read", &self.rows_read)
            .finish()
    }
}

impl PostgresSource {
    /// Connects to the source database and starts the table scan.
    ///
    /// The connection does not use TLS. Fails if the server is unreachable, the credentials are
    /// wrong or the table cannot be queried.
    pub async fn connect(config: &SourceConfig) -> EtlResult<Self> {
        let table = TableName::parse(&config.table)?;

        let pg_config: Config = config
            .connection
            .with_db(Some(&ETL_INGESTER_SOURCE_OPTIONS));
        let (client, connection) = pg_config.connect(NoTls).await?;
        spawn_postgres_connection::<NoTls>(connection);

        info!(
            host = %config.connection.host,
            database = %config.connection.name,
            "successfully connected to postgres without tls"
        );

        let query = build_select_query(&table, config.row_limit());
        debug!(%query, "starting table scan");

        let rows = client
            .query_raw(query.as_str(), std::iter::empty::<&(dyn ToSql + Sync)>())
            .await?;

        Ok(Self {
            _client: client,
            rows: Box::pin(rows),
            table,
            rows_read: 0,
        })
    }

    /// Returns the scanned table.
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Returns the number of rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

impl Source for PostgresSource {
    fn name() -> &'static str {
        "postgres"
    }

    async fn next_record(&mut self) -> EtlResult<Option<Record>> {
        let Some(row) = self.rows.next().await else {
            info!(table = %self.table, rows_read = self.rows_read, "table scan finished");
            return Ok(None);
        };

        let document: Option<String> = row?.try_get(0)?;
        let record = document_to_record(document, self.rows_read + 1, &self.table)?;

        self.rows_read += 1;

        Ok(Some(record))
    }
}

/// Turns the rendered document of row `row_number` into a [`Record`].
///
/// A null document means the row could not be rendered and fails the scan.
fn document_to_record(
    document: Option<String>,
    row_number: u64,
    table: &TableName,
) -> EtlResult<Record> {
    match document {
        Some(document) => Ok(Record::new(document)),
        None => Err(etl_error!(
            ErrorKind::InvalidData,
            "Unexpected null row",
            format!("Row {row_number} of table {table} was rendered as a null document")
        )),
    }
}
