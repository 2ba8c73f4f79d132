//! Bounded retry with exponential backoff for ingestion batches.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RagError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 10_000,
            max_backoff_ms: 60_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0 = first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(retry as i32);
        let capped = base.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. Only transient errors are retried.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, RagError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RagError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.backoff(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max = max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "{} failed, retrying",
                        label
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> RagError {
        RagError::Embedding(ProviderError::RateLimited { provider: "gemini" })
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4_000));
        assert_eq!(policy.backoff(3), Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy
            .run("embed batch", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };

        let result: Result<(), RagError> = policy
            .run("embed batch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RagError> = RetryPolicy::default()
            .run("embed batch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RagError::Embedding(ProviderError::AuthFailed {
                    provider: "gemini",
                }))
            })
            .await;

        assert!(matches!(result, Err(RagError::Embedding(ProviderError::AuthFailed { .. }))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
