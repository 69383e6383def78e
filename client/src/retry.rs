//! Timeout and fixed-delay retry, composed as "retry wraps timeout".

use std::future::Future;
use std::time::Duration;

use medtrack_core::{ApiError, RetryPolicy, RetryScope};

/// Race `fut` against a timer; the timer winning is `ApiError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout),
    }
}

/// Whether `policy` permits another attempt after `err`.
pub fn should_retry(policy: &RetryPolicy, err: &ApiError) -> bool {
    match policy.scope {
        RetryScope::AllFailures => true,
        RetryScope::TransportOnly => err.is_transport(),
    }
}

/// Run `op` up to `policy.total_attempts()` times, sleeping `policy.delay`
/// between attempts. `op` receives the 1-based attempt number. The last
/// attempt's error is returned when the budget is exhausted.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let attempts = policy.total_attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && should_retry(policy, &err) => {
                tracing::warn!(attempt, of = attempts, error = %err, "request failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
