//! Bounded exponential-backoff retry around calls to the generation service.
//!
//! Attempt `k` (0-indexed) waits `min(base * factor^k, max_delay)`, jittered by ±25%.
//! A rate-limit answer carrying "retry after N seconds" waits `N + [0.1, 0.5]s` instead,
//! with `N` capped at the maximum delay.
//! Only transient failures (see `LlmError::is_retryable`) are retried.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::llm_client::LlmError;

/// Jitter range applied on top of a service-provided retry-after hint, in seconds.
pub const HINT_JITTER_MIN: f64 = 0.1;
pub const HINT_JITTER_MAX: f64 = 0.5;

/// Retry budget and delay schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    /// ±25% randomization of the exponential schedule.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(300),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Exponential delay before retry number `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let raw = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let mut delay = raw.min(self.max_delay.as_secs_f64());

        if self.jitter {
            let range = delay * 0.25;
            delay += rand::thread_rng().gen_range(-range..=range);
        }

        Duration::from_secs_f64(delay.max(0.0))
    }

    /// Delay honoring an explicit retry-after hint, capped at `max_delay`.
    ///
    /// `None` when the hint cannot be expressed as a `Duration`.
    pub fn hint_delay(&self, retry_after_secs: f64) -> Option<Duration> {
        let jitter = rand::thread_rng().gen_range(HINT_JITTER_MIN..=HINT_JITTER_MAX);
        let capped = retry_after_secs
            .max(0.0)
            .min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped + jitter).ok()
    }

    fn delay_for(&self, attempt: u32, err: &LlmError) -> Duration {
        err.retry_after()
            .filter(|secs| secs.is_finite())
            .and_then(|secs| self.hint_delay(secs))
            .unwrap_or_else(|| self.backoff_delay(attempt))
    }
}

/// Wraps every call to the external service with the retry policy.
#[derive(Debug, Clone, Default)]
pub struct RetryingInvoker {
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails fatally, or the budget is spent.
    /// On exhaustion the last failure is returned unchanged.
    pub async fn invoke<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let total_attempts = self.policy.max_retries + 1;
        let mut attempt = 0;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                error!("{label} failed with non-retryable error: {err}");
                return Err(err);
            }

            if attempt >= self.policy.max_retries {
                error!("{label} failed after {total_attempts} attempts. Last error: {err}");
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt, &err);
            warn!(
                "{label} failed on attempt {}/{}: {err}. Retrying in {:.2}s...",
                attempt + 1,
                total_attempts,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
