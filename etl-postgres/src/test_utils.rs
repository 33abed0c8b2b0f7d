use etl_config::shared::{IntoConnectOptions, PgConnectionConfig, SourceConfig};
use tokio_postgres::{Client, NoTls};
use tracing::info;
use uuid::Uuid;

/// Schema holding the tables created by tests.
pub const TEST_DATABASE_SCHEMA: &str = "test";

/// Builds the connection configuration of a fresh test database.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname (required)
/// - `TESTS_DATABASE_PORT`: Postgres server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
///
/// Every call picks a unique database name so tests never share state.
pub fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: Uuid::new_v4().to_string(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        keepalive: None,
    }
}

/// Temporary database living for the duration of one test.
///
/// The database is created with a [`TEST_DATABASE_SCHEMA`] schema. Call
/// [`PgDatabase::cleanup`] at the end of the test to drop it.
pub struct PgDatabase {
    pub config: PgConnectionConfig,
    pub client: Client,
}

impl PgDatabase {
    /// Creates a uniquely named database on the test server and connects to it.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or the database cannot be created.
    pub async fn new() -> Self {
        let config = local_pg_connection_config();

        let admin = connect(&config, false).await;
        admin
            .execute(&format!(r#"create database "{}""#, config.name), &[])
            .await
            .expect("Failed to create test database");

        let client = connect(&config, true).await;
        client
            .execute(&format!("create schema {TEST_DATABASE_SCHEMA}"), &[])
            .await
            .expect("Failed to create test schema");

        info!(database = %config.name, "created test database");

        Self { config, client }
    }

    /// Returns a source configuration scanning `table` in this database.
    pub fn source_config(&self, table: &str, max_fetch_rows: Option<u64>) -> SourceConfig {
        SourceConfig {
            connection: self.config.clone(),
            table: table.to_string(),
            max_fetch_rows,
        }
    }

    /// Runs one or more statements, panicking on failure.
    pub async fn run_sql(&self, sql: &str) {
        self.client
            .batch_execute(sql)
            .await
            .unwrap_or_else(|err| panic!("Failed to run `{sql}`: {err}"));
    }

    /// Drops the database, terminating every connection still open on it.
    ///
    /// Failures are printed and otherwise ignored, a leftover database never fails a test.
    pub async fn cleanup(self) {
        let PgDatabase { config, client } = self;
        drop(client);

        let admin = connect(&config, false).await;

        if let Err(err) = admin
            .execute(
                "select pg_terminate_backend(pg_stat_activity.pid) from pg_stat_activity \
                 where pg_stat_activity.datname = $1 and pid <> pg_backend_pid()",
                &[&config.name],
            )
            .await
        {
            eprintln!("warning: failed to terminate connections to {}: {err}", config.name);
        }

        if let Err(err) = admin
            .execute(
                &format!(r#"drop database if exists "{}""#, config.name),
                &[],
            )
            .await
        {
            eprintln!("warning: failed to drop test database {}: {err}", config.name);
        }
    }
}

async fn connect(config: &PgConnectionConfig, with_db: bool) -> Client {
    let pg_config: tokio_postgres::Config = if with_db {
        config.with_db(None)
    } else {
        config.without_db(None)
    };

    let (client, connection) = pg_config
        .connect(NoTls)
        .await
        .expect("Failed to connect to the test server");

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            eprintln!("test connection error: {err}");
        }
    });

    client
}
