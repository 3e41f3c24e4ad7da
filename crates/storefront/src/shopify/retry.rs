//! Retry policy for Storefront API calls.

use std::time::Duration;

use backon::ExponentialBuilder;

/// How often and how patiently a Storefront API call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Timeout of the first attempt; attempt `n` gets `n` times this.
    pub base_timeout: Duration,
    /// Backoff before the first retry.
    pub min_delay: Duration,
    /// Upper bound for any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_timeout: Duration::from_secs(5),
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure.
    #[must_use]
    pub const fn no_retry(base_timeout: Duration) -> Self {
        Self {
            max_retries: 0,
            base_timeout,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Number of requests made before giving up.
    #[must_use]
    pub const fn total_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Timeout for the given 1-based attempt.
    ///
    /// ```
    /// use std::time::Duration;
    /// use alltagsgold_storefront::shopify::RetryPolicy;
    ///
    /// let policy = RetryPolicy { base_timeout: Duration::from_secs(5), ..RetryPolicy::default() };
    /// assert_eq!(policy.timeout_for_attempt(3), Duration::from_secs(15));
    /// ```
    #[must_use]
    pub fn timeout_for_attempt(&self, attempt: u32) -> Duration {
        self.base_timeout.saturating_mul(attempt.max(1))
    }

    /// Exponential backoff with jitter between attempts.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_factor(2.0)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}
