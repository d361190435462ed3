//! Timeout utilities for browser and network operations
//!
//! Wraps futures with `tokio::time::timeout` so launch, navigation and
//! scroll never hang a request indefinitely.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run a fallible operation with an explicit deadline
///
/// Returns an error naming the operation when the deadline passes, so the
/// caller can tell a timeout apart from the operation's own failure.
pub async fn with_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} seconds",
            timeout.as_secs()
        )),
    }
}

/// Race `operation` against a timer, dropping whichever loses
///
/// `Some(output)` when the operation finished first, `None` when the timer
/// did. The operation future is cancelled on timeout.
pub async fn run_until_timeout<F>(operation: F, timeout: Duration) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        output = operation => Some(output),
        () = tokio::time::sleep(timeout) => None,
    }
}
