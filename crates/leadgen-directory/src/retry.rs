//! Linear-backoff retry for directory lookups.
//!
//! Transient failures (network errors, 5xx responses, quota pushback) are
//! retried with a delay of `base_delay * attempt_number`; everything else is
//! returned immediately. Expressed as a loop with an attempt counter rather
//! than recursion.

use std::future::Future;
use std::time::Duration;

use crate::error::DirectoryError;
use crate::types::STATUS_OVER_QUERY_LIMIT;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable: network-level failures (timeout, connection reset), 5xx
/// responses, and the API's quota-pushback status. Not retriable: other API
/// statuses, 4xx responses, deserialization failures, missing configuration.
pub(crate) fn is_retriable(err: &DirectoryError) -> bool {
    match err {
        DirectoryError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        DirectoryError::UnexpectedStatus { status, .. } => *status >= 500,
        DirectoryError::Api { status, .. } => status == STATUS_OVER_QUERY_LIMIT,
        DirectoryError::Deserialize { .. } | DirectoryError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, sleeping `base_delay_ms * attempt_number` between
/// attempts (linear backoff: 1×, 2×, 3×, …).
///
/// With `max_retries = 3` the operation runs at most 4 times. The last error
/// is returned once retries are exhausted; non-retriable errors are returned
/// immediately without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay_ms: u64,
    mut operation: F,
) -> Result<T, DirectoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DirectoryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = base_delay_ms.saturating_mul(u64::from(attempt));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient directory error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
