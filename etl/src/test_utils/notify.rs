use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Default upper bound for awaiting pipeline futures in tests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Awaits `future`, panicking when it does not complete within [`DEFAULT_TIMEOUT`].
///
/// A deadlocked pipeline would otherwise hang the whole test binary.
pub async fn within_timeout<F>(future: F) -> F::Output
where
    F: Future,
{
    match timeout(DEFAULT_TIMEOUT, future).await {
        Ok(output) => output,
        Err(_) => panic!("future did not complete within {DEFAULT_TIMEOUT:?}"),
    }
}
