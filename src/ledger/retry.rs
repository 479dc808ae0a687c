//! Bounded retry around a whole unit of work
//!
//! Version conflicts are the only retryable failure. The unit closure is
//! re-executed from its first read, so every attempt works on fresh account
//! snapshots; nothing from a conflicted attempt is reused. Business failures
//! and storage faults propagate immediately.

use std::future::Future;
use std::time::Duration;

use crate::domain::LedgerError;

/// Retry settings for contended units of work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, the first execution included.
    pub max_attempts: u32,
    /// Fixed pause between attempts, no jitter.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Run `unit` until it succeeds, fails terminally, or exhausts the policy.
///
/// After the final conflicted attempt the caller sees
/// `LedgerError::ConcurrencyExhausted`, never the raw conflict.
pub async fn run_with_retry<T, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    unit: impl Fn() -> Fut,
) -> Result<T, LedgerError>
where
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match unit().await {
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    tracing::warn!(operation, attempt, "version conflict, attempts exhausted");
                    return Err(LedgerError::ConcurrencyExhausted { attempts: attempt });
                }
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    "version conflict, re-running unit of work"
                );
                tokio::time::sleep(policy.delay).await;
            }
            other => return other,
        }
    }
}
