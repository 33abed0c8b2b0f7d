use etl::error::EtlError;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for ingester operations.
pub type IngesterResult<T> = Result<T, IngesterError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the ingester binary.
///
/// Wraps [`EtlError`] for pipeline errors and provides variants for setup errors.
#[derive(Debug)]
pub enum IngesterError {
    /// Pipeline, source or destination error.
    Etl(EtlError),
    /// Configuration or telemetry setup error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
}

impl IngesterError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            IngesterError::Etl(_) => "ingestion error",
            IngesterError::Config(_, _) => "configuration error",
            IngesterError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            IngesterError::Etl(err) => err.backtrace(),
            IngesterError::Config(_, cb) => Some(&cb.0),
            IngesterError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        IngesterError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("ingester failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {}\n", self));

        if !matches!(self, IngesterError::Etl(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for IngesterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngesterError::Etl(err) => write!(f, "{err}"),
            IngesterError::Config(source, _) => write!(f, "configuration error: {source}"),
            IngesterError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for IngesterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IngesterError::Etl(err) => err.source(),
            IngesterError::Config(source, _) => Some(source.as_ref()),
            IngesterError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for IngesterError {
    fn from(err: std::io::Error) -> Self {
        IngesterError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<EtlError> for IngesterError {
    fn from(err: EtlError) -> Self {
        IngesterError::Etl(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etl::error::ErrorKind;
    use etl::etl_error;

    #[test]
    fn report_lists_category_and_causes() {
        let io_err = std::io::Error::other("disk unplugged");
        let err = IngesterError::config(io_err);

        let report = err.render_report();

        assert!(report.starts_with("ingester failed\n"));
        assert!(report.contains("category: configuration error\n"));
        assert!(report.contains("error: configuration error: disk unplugged\n"));
        assert!(report.contains("cause 1: disk unplugged\n"));
    }

    #[test]
    fn etl_errors_keep_their_message() {
        let err: IngesterError = etl_error!(
            ErrorKind::SourceIoError,
            "Source read failed",
            "connection reset"
        )
        .into();

        assert_eq!(err.category(), "ingestion error");
        assert!(err.to_string().contains("Source read failed"));
    }
}
