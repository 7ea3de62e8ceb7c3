//! Bounded exponential backoff for page fetches.
//!
//! The n-th retry (1-based) waits `base ^ n` seconds. There is no jitter, so
//! delays are reproducible across runs.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};

/// Default number of retries after the first failed attempt.
pub const MAX_RETRIES: usize = 4;

/// Default backoff base, in seconds.
pub const RETRY_BASE: f64 = 1.5;

/// Upper bound for any single backoff delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Exponential base; the n-th retry waits `base ^ n` seconds.
    pub base: f64,
    /// Maximum number of retries (the first attempt is not counted).
    pub max_retries: usize,
    /// Cap applied to every computed delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base: RETRY_BASE,
            max_retries: MAX_RETRIES,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(base: f64, max_retries: usize) -> Self {
        Self {
            base,
            max_retries,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Whether the base produces usable delays.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.base.is_finite() && self.base > 0.0
    }

    /// The delay that precedes retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.base.powi(attempt as i32);
        if !secs.is_finite() || secs > self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

}

/// The retry schedule as a backon strategy.
///
/// Each delay comes from [`RetryConfig::delay_for`] in `f64`, so the n-th
/// retry waits exactly `base ^ n` seconds (up to the cap).
impl BackoffBuilder for RetryConfig {
    type Backoff = Delays;

    fn build(self) -> Delays {
        Delays {
            config: self,
            attempt: 0,
        }
    }
}

/// Iterator over the delays of a [`RetryConfig`], one per allowed retry.
#[derive(Debug, Clone)]
pub struct Delays {
    config: RetryConfig,
    attempt: u32,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt as usize >= self.config.max_retries {
            return None;
        }
        self.attempt += 1;
        Some(self.config.delay_for(self.attempt))
    }
}

/// Run `operation`, retrying errors accepted by `is_retryable`.
///
/// `on_retry` is called once per scheduled retry with the error that caused
/// it, the delay about to be slept and the 1-based retry number. Once the
/// retry budget is spent, the last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut, IsRetryable, OnRetry>(
    operation: F,
    config: &RetryConfig,
    is_retryable: IsRetryable,
    mut on_retry: OnRetry,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    IsRetryable: FnMut(&E) -> bool,
    OnRetry: FnMut(&E, Duration, u32),
{
    let mut attempt = 0u32;

    operation
        .retry(config.clone())
        .notify(|err: &E, delay: Duration| {
            attempt += 1;
            on_retry(err, delay, attempt);
        })
        .when(is_retryable)
        .await
}
