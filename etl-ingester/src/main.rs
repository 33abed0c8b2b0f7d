//! ETL ingester binary.
//!
//! Streams every row of a Postgres table, rendered as JSON, into a bulk destination through a
//! bounded worker pipeline, printing the running counters on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use etl_config::shared::IngesterConfig;
use etl_telemetry::metrics::init_metrics;
use etl_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_ingester_config;
use crate::core::start_ingester_with_config;
use crate::error::{IngesterError, IngesterResult};

mod config;
mod core;
mod error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the configuration file (yaml, yml or json).
    config: PathBuf,

    /// Number of bulk workers, overriding `pipeline.max_workers`.
    workers: Option<u16>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_tracing(env!("CARGO_BIN_NAME")) {
        eprint!("{}", IngesterError::config(err).render_report());

        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    }
}

/// Loads configuration, starts the async runtime and runs the ingestion.
///
/// Tracing must already be installed, so that configuration failures are logged too.
fn run(args: Args) -> IngesterResult<()> {
    let config = load_ingester_config(&args.config, args.workers)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(config))
}

/// Logs a fatal error and prints its report on stderr.
fn report_failure(err: &IngesterError) -> ExitCode {
    error!(category = err.category(), "{err}");
    eprint!("{}", err.render_report());

    ExitCode::FAILURE
}

async fn async_main(config: IngesterConfig) -> IngesterResult<()> {
    // The exporter spawns its listener on the current runtime.
    if let Some(listen_address) = config.metrics_listen_address {
        init_metrics(listen_address).map_err(IngesterError::config)?;
    }

    start_ingester_with_config(config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Writer collecting formatted log lines in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn missing_config_file_fails_before_the_runtime_starts() {
        let args = Args {
            config: PathBuf::from("/nonexistent/etl-ingester.yaml"),
            workers: None,
        };

        let err = run(args).unwrap_err();

        assert_eq!(err.category(), "configuration error");
    }

    #[test]
    fn config_failures_are_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let args = Args {
            config: PathBuf::from("/nonexistent/etl-ingester.yaml"),
            workers: None,
        };
        let err = run(args).unwrap_err();
        let exit_code = tracing::subscriber::with_default(subscriber, || report_failure(&err));

        assert_eq!(exit_code, ExitCode::FAILURE);

        let logs = logs.contents();
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("category=\"configuration error\""));
        assert!(logs.contains(&err.to_string()));
    }
}
