//! Backoff for retrying a whole read-modify-write cycle after a version conflict.

use std::time::Duration;

use rand::Rng;

use crate::shared::config::LedgerConfig;

/// Configuration for conflict retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_multiplier: f64,
    /// Add up to 50% random jitter so colliding writers spread out
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            max_retries: config.max_conflict_retries,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let mut delay_ms = self.base_delay.as_millis() as f64 * multiplier;

        if self.jitter && delay_ms > 0.0 {
            delay_ms += rand::thread_rng().gen_range(0.0..=delay_ms * 0.5);
        }

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}
