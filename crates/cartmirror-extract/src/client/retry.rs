//! Retry policy for cart API calls.
//!
//! Cart reads and mutations are not retried by default; a failed call is
//! treated as "no data" and the widget falls back. When `max_retries` is
//! configured above zero, rate-limit and network failures are retried with
//! exponential backoff. Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ExtractError;

/// Returns `true` if `err` is a transient condition worth another attempt:
/// an HTTP 429 or a network-level failure.
fn is_retriable(err: &ExtractError) -> bool {
    matches!(
        err,
        ExtractError::RateLimited { .. } | ExtractError::Http(_)
    )
}

/// Executes `operation`, retrying transient errors up to `max_retries`
/// additional times.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds,
/// or the server's `Retry-After` when a rate-limit response carried a longer
/// one. Non-retriable errors and the last transient error are returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ExtractError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExtractError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let backoff_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        let delay_secs = match &err {
            ExtractError::RateLimited {
                retry_after_secs, ..
            } if backoff_base_secs > 0 => backoff_secs.max(*retry_after_secs),
            _ => backoff_secs,
        };
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient cart API error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
