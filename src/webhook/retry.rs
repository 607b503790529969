//! Retry policy configuration for webhook deliveries.

use std::time::Duration;

use crate::config::defaults;

/// Exponential backoff retry behavior.
///
/// A delivery makes `max_attempts` attempts. Between two attempts it waits
/// for the current delay, which starts at `initial_delay` and doubles after
/// every wait. There is no upper cap.
///
/// # Defaults
///
/// - `max_attempts`: 1 (no retry)
/// - `initial_delay`: 1 second
///
/// # Example
///
/// ```
/// use jobhook::webhook::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::from_retry_count(3)
///     .with_initial_delay(Duration::from_millis(500));
///
/// assert_eq!(policy.max_attempts, 4);
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    ///
    /// A value of 1 means no retries; only the initial attempt is made.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a policy that makes a single attempt.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::MIN_MAX_ATTEMPTS,
            initial_delay: defaults::retry_backoff(),
        }
    }

    /// Creates a policy from a configured retry count (`count + 1` attempts).
    #[must_use]
    pub const fn from_retry_count(count: u32) -> Self {
        Self::new().with_max_attempts(count.saturating_add(1))
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial delay between attempts.
    ///
    /// Zero delay is allowed and produces a tight retry loop.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.max_attempts - 1
    }

    /// Computes the delay for a given retry number (0-indexed).
    ///
    /// Retry 0 waits `initial_delay`, retry 1 twice that, and so on.
    /// Saturates at [`Duration::MAX`].
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Returns true if another attempt follows the given one.
    ///
    /// `attempt` is 1-based (1 = first attempt).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
