//! Optional re-arm delay after consecutive failed round trips.
//!
//! Disabled by default: the loop then retries at its fixed cadence forever.

use std::time::Duration;

/// Base delay added after the first failure.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Cap on the added delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// `min(base * 2^attempt, max)`, saturating.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(max)
}

/// Tracks consecutive failures and the extra delay they earn.
#[derive(Debug, Clone)]
pub struct FailureBackoff {
    enabled: bool,
    base: Duration,
    max: Duration,
    consecutive_failures: u32,
}

impl FailureBackoff {
    pub fn new(enabled: bool) -> Self {
        Self::with_limits(enabled, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX)
    }

    pub fn with_limits(enabled: bool, base: Duration, max: Duration) -> Self {
        Self {
            enabled,
            base,
            max,
            consecutive_failures: 0,
        }
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Extra delay to add to the next re-arm.
    pub fn delay(&self) -> Duration {
        if !self.enabled || self.consecutive_failures == 0 {
            return Duration::ZERO;
        }
        calculate_backoff(self.consecutive_failures - 1, self.base, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff_doubles() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(60);
        assert_eq!(calculate_backoff(0, base, max), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, base, max), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, base, max), Duration::from_millis(800));
    }

    #[test]
    fn test_calculate_backoff_respects_max() {
        let delay = calculate_backoff(40, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(delay, Duration::from_secs(10));
    }

    #[test]
    fn test_disabled_backoff_never_delays() {
        let mut backoff = FailureBackoff::new(false);
        for _ in 0..5 {
            backoff.record_failure();
        }
        assert_eq!(backoff.consecutive_failures(), 5);
        assert_eq!(backoff.delay(), Duration::ZERO);
    }

    #[test]
    fn test_enabled_backoff_grows_and_resets() {
        let mut backoff = FailureBackoff::new(true);
        assert_eq!(backoff.delay(), Duration::ZERO);

        backoff.record_failure();
        assert_eq!(backoff.delay(), DEFAULT_BACKOFF_BASE);
        backoff.record_failure();
        assert_eq!(backoff.delay(), DEFAULT_BACKOFF_BASE * 2);

        backoff.record_success();
        assert_eq!(backoff.delay(), Duration::ZERO);
    }
}
