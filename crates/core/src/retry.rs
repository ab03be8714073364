//! # Retry Policy
//!
//! Bounded exponential-backoff retry for individual external calls (web
//! search, LLM completions, image lookups, publish requests). The policy
//! wraps one call site at a time; whole pipeline stages are never retried.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with exponential backoff.
///
/// Waits `base_delay * 2^(attempt-1)` between attempts, capped at
/// `max_delay`. The defaults (3 attempts, 4s..10s waits) match the budget
/// used across the pipeline's external integrations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and default delays.
    ///
    /// A budget of zero is clamped to one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Override the backoff window.
    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before re-running after the given 1-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted.
    ///
    /// Returns the first `Ok`, or the error from the final attempt.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => return Err(err),
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "call failed, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_delays(Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, String> = fast(3)
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".to_string())
                } else {
                    Ok("payload")
                }
            })
            .await;

        assert_eq!(result, Ok("payload"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_budget_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = fast(3)
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {n}"))
            })
            .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast(5)
            .run(|| async { Ok(calls.fetch_add(1, Ordering::SeqCst)) })
            .await;

        assert_eq!(result, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5)
            .with_delays(Duration::from_secs(4), Duration::from_secs(10));
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(2), Duration::from_secs(8));
        assert_eq!(policy.delay_after(3), Duration::from_secs(10));
        assert_eq!(policy.delay_after(4), Duration::from_secs(10));
    }

    #[test]
    fn zero_budget_clamps_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}
