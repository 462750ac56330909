//! Retry Backoff
//!
//! Exponential backoff between synthesis attempts.
//!
//! **Backoff Strategy:**
//! - Initial delay: `retry_delay_ms` (default 1000ms)
//! - Max delay: `max_retry_delay_ms` (default 8000ms)
//! - Multiplier: 2.0 (exponential)
//!
//! An initial delay of zero disables pausing entirely.

use std::time::Duration;

/// Exponential backoff schedule
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    /// Delay to wait now; doubles the following one, capped at `max`
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.checked_mul(2).unwrap_or(self.max).min(self.max);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_until_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(3000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(2000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(3000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_zero_initial_stays_zero() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_secs(8));
        assert_eq!(backoff.next_delay(), Duration::ZERO);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_initial_above_cap_is_clamped() {
        let mut backoff = Backoff::new(Duration::from_secs(20), Duration::from_secs(8));
        assert_eq!(backoff.next_delay(), Duration::from_secs(8));
    }
}
