//! Bounded exponential backoff for metadata retrieval.

use std::time::Duration;

/// Default maximum attempts per retrieval (1 initial + 3 retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default base delay, doubled on each successive retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Retry schedule for one metadata retrieval.
///
/// The delay before attempt `n` (0-indexed) is `base_delay * 2^(n-1)`; the
/// first attempt is immediate. No jitter is applied, so the schedule is
/// deterministic: with defaults the waits are 2s, 4s, 8s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one.
    max_attempts: u32,
    /// Base delay for the first retry.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom ceiling and base delay.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to apply before the given attempt (0-indexed).
    ///
    /// Attempt 0 is immediate; attempt `n > 0` waits `base * 2^(n-1)`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt - 1))
    }
}
