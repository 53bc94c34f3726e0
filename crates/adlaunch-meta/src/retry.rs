//! Retry policy
//!
//! Bounded retry with a fixed backoff, expressed as a value so callers can
//! carry the policy in configuration instead of hand-rolled counters. The
//! sleep goes through tokio's clock, so paused-clock tests run instantly.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Max attempts and fixed delay between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Run `operation` up to `policy.max_attempts` times. The attempt number
/// (1-based) is passed in so the operation can resume from saved progress.
/// Errors for which `is_retryable` returns false abort immediately.
pub async fn retry_with_policy<T, E, F, Fut, R>(
    policy: RetryPolicy,
    operation_name: &str,
    mut is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    backoff_secs = policy.backoff.as_secs(),
                    "Retryable failure, backing off"
                );
                sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
