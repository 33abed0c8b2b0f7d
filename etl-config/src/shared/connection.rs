use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tokio_postgres::{Config as TokioPgConnectOptions, config::SslMode as TokioPgSslMode};

use crate::shared::ValidationError;
use crate::shared::base::require_non_empty;

/// Common Postgres settings shared across all connection types.
const COMMON_DATESTYLE: &str = "ISO";
const COMMON_INTERVALSTYLE: &str = "postgres";
const COMMON_EXTRA_FLOAT_DIGITS: i32 = 3;
const COMMON_CLIENT_ENCODING: &str = "UTF8";
const COMMON_TIMEZONE: &str = "UTC";

const APP_NAME_INGESTER_SOURCE: &str = "etl_ingester_source";

/// Connection options for the source scan.
///
/// The scan is a single long-running statement, so statement and idle timeouts are disabled.
/// The fixed `extra_float_digits` and `timezone` keep the JSON rendering of rows stable across
/// server configurations.
pub static ETL_INGESTER_SOURCE_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        datestyle: COMMON_DATESTYLE.to_string(),
        intervalstyle: COMMON_INTERVALSTYLE.to_string(),
        extra_float_digits: COMMON_EXTRA_FLOAT_DIGITS,
        client_encoding: COMMON_CLIENT_ENCODING.to_string(),
        timezone: COMMON_TIMEZONE.to_string(),
        statement_timeout: 0,
        lock_timeout: 30_000,
        idle_in_transaction_session_timeout: 0,
        application_name: APP_NAME_INGESTER_SOURCE.to_string(),
    });

#[derive(Debug, Clone)]
pub struct PgConnectionOptions {
    pub datestyle: String,
    pub intervalstyle: String,
    pub extra_float_digits: i32,
    pub client_encoding: String,
    pub timezone: String,
    pub statement_timeout: u32,
    pub lock_timeout: u32,
    pub idle_in_transaction_session_timeout: u32,
    pub application_name: String,
}

impl PgConnectionOptions {
    pub fn to_options_string(&self) -> String {
        format!(
            "-c datestyle={} -c intervalstyle={} -c extra_float_digits={} -c client_encoding={} -c timezone={} -c statement_timeout={} -c lock_timeout={} -c idle_in_transaction_session_timeout={} -c application_name={}",
            self.datestyle,
            self.intervalstyle,
            self.extra_float_digits,
            self.client_encoding,
            self.timezone,
            self.statement_timeout,
            self.lock_timeout,
            self.idle_in_transaction_session_timeout,
            self.application_name
        )
    }
}

/// Connection settings for the source Postgres database.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally leaking the
/// password into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Name of the database.
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    /// TCP keepalive configuration for connection health monitoring.
    /// When `None`, TCP keepalives are disabled.
    #[serde(default)]
    pub keepalive: Option<TcpKeepaliveConfig>,
}

impl PgConnectionConfig {
    /// Validates that every field needed to connect is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("source.connection.host", &self.host)?;

        if self.port == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.connection.port",
                constraint: "must be greater than 0".to_string(),
            });
        }

        require_non_empty("source.connection.name", &self.name)?;
        require_non_empty("source.connection.username", &self.username)?;

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TcpKeepaliveConfig {
    pub idle_secs: u64,
    pub interval_secs: u64,
    pub retries: u32,
}

impl Default for TcpKeepaliveConfig {
    fn default() -> Self {
        Self {
            idle_secs: 30,
            interval_secs: 30,
            retries: 3,
        }
    }
}

pub trait IntoConnectOptions<Output> {
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> Output;
    fn with_db(&self, options: Option<&PgConnectionOptions>) -> Output;
}

impl IntoConnectOptions<TokioPgConnectOptions> for PgConnectionConfig {
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let mut config = TokioPgConnectOptions::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .ssl_mode(TokioPgSslMode::Disable);

        if let Some(password) = &self.password {
            config.password(password.expose_secret());
        }

        if let Some(keepalive) = &self.keepalive {
            config
                .keepalives(true)
                .keepalives_idle(Duration::from_secs(keepalive.idle_secs))
                .keepalives_interval(Duration::from_secs(keepalive.interval_secs))
                .keepalives_retries(keepalive.retries);
        }

        if let Some(opts) = options {
            config.options(&opts.to_options_string());
        }

        config
    }

    fn with_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let mut config: TokioPgConnectOptions = self.without_db(options);
        config.dbname(&self.name);
        config
    }
}
