// Retry-with-backoff for transient delivery failures.
//
// Exponential backoff with full jitter between a floor and a cap.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::RngExt;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Smallest delay between attempts; also the exponential base.
    pub min_delay: Duration,
    /// Hard cap on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed).
    ///
    /// Uniformly random in
    /// `[min_delay, min(max_delay, min_delay * 2^(attempt + 1))]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Saturate instead of overflowing for large attempt numbers.
        let multiplier = attempt
            .checked_add(1)
            .and_then(|exp| 1u32.checked_shl(exp))
            .unwrap_or(u32::MAX);
        let ceiling = self
            .min_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        let floor = self.min_delay.min(ceiling);

        let floor_ms = u64::try_from(floor.as_millis()).unwrap_or(u64::MAX);
        let ceiling_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        if ceiling_ms <= floor_ms {
            return ceiling;
        }

        Duration::from_millis(rand::rng().random_range(floor_ms..=ceiling_ms))
    }
}

/// Execute an async operation with retry-and-backoff.
///
/// `operation` receives the attempt number (0-indexed). The last error is
/// returned once `max_attempts` is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 >= max_attempts => return Err(err),
            Err(err) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
