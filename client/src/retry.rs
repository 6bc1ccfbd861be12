//! Backoff schedule for failed refreshes

use std::time::Duration;

use sg_shared::config::RetrySettings;

/// Exponential backoff followed by one deferred attempt
///
/// Attempt `n` (1-based) waits `base_delay * 2^(n-1)`. Once `max_retries`
/// attempts have failed, one last attempt runs after `cooldown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
    pub cooldown: Duration,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_retries: u32, cooldown: Duration) -> Self {
        Self {
            base_delay,
            max_retries,
            cooldown,
        }
    }

    /// Delay before retry `attempt`, counting from 1
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Delays of every backoff retry, in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retries).map(|attempt| self.delay_for(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.base_delay(), settings.max_retries, settings.cooldown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 4, Duration::from_secs(300));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 100, Duration::ZERO);
        assert!(policy.delay_for(100) >= policy.delay_for(32));
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 0, Duration::from_secs(1));
        assert_eq!(policy.delays().count(), 0);
    }
}
