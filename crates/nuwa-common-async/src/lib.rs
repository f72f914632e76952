//! Async runtime utilities.

use std::future::Future;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

/// Run a future with a timeout.
///
/// The inner future is dropped when the deadline fires, which aborts any
/// in-flight I/O it owns.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { after: duration })
}

/// Timeout error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation timed out after {}ms", after.as_millis())]
pub struct TimeoutError {
    /// The deadline that elapsed.
    pub after: Duration,
}

/// Cancellation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Fail fast if the token has already fired.
pub fn check_cancelled(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}

/// Sleep for a duration unless the token fires first.
pub async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
    check_cancelled(token)?;
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Run a future unless the token fires first.
pub async fn run_or_cancel<F, T>(future: F, token: &CancellationToken) -> Result<T, Cancelled>
where
    F: Future<Output = T>,
{
    check_cancelled(token)?;
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        v = future => Ok(v),
    }
}

/// Run multiple futures concurrently, returning when all complete.
pub async fn join_all<I, F, T>(futures: I) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T>,
{
    futures::future::join_all(futures).await
}

/// Sleep for a duration.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await
}
