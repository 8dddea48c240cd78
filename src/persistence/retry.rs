//! Bounded retry for transient store failures.
//!
//! Only [`StoreError::Unavailable`] is retried; unique violations and
//! missing rows are terminal and surface immediately.

use std::future::Future;
use std::time::Duration;

use super::record_store::StoreError;

/// Retry configuration for store calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Runs `op`, retrying transient failures per the policy.
///
/// # Errors
///
/// Returns the last [`StoreError`] once attempts are exhausted, or the
/// first terminal error.
pub async fn with_retry<T, Fut, F>(policy: &RetryPolicy, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(attempt, error = %err, "transient store failure; retrying");
                tokio::time::sleep(policy.backoff).await;
                attempt = attempt.saturating_add(1);
            }
            Err(err) => return Err(err),
        }
    }
}
