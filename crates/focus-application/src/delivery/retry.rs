use std::time::Duration;

use focus_core::config::CollectorConfig;

/// Attempt budget and exponential backoff for foreground delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }

    /// Delay after the `failed_attempt`-th failure (1-based): base * 2^(n-1),
    /// capped at `max_delay`.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        let exp_delay = self.base_delay.saturating_mul(1u32 << exponent);
        exp_delay.min(self.max_delay)
    }
}
