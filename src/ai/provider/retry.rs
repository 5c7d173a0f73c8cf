//! Provider retry schedule
//!
//! Linear backoff: after failed attempt `n` the client waits `n * base`
//! before attempt `n + 1` (800ms, 1600ms with the defaults).

use std::time::Duration;

use crate::config::RetryConfig;
use crate::constants::retry as retry_constants;

/// Attempt budget and backoff for one logical provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Linear backoff step
    pub backoff_base: Duration,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(retry_constants::BACKOFF_BASE_MS),
        }
    }
}

impl RetrySchedule {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
        )
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    /// Upper bound on total sleeping across one logical call
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|a| self.delay_after(a)).sum()
    }
}
