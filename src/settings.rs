//! Runtime tunables
//!
//! The binary always runs with [`Settings::default`]; the fields exist so tests
//! and embedders can shorten the cadence or change the retry policy.

use std::time::Duration;

/// Polling cadence and fetch retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Time between samples
    pub interval: Duration,
    /// Extra attempts after a failed counter read
    pub max_retries: u32,
    /// Base delay between attempts, doubled after each failure
    pub retry_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_retries: 2,
            retry_delay_ms: 100,
        }
    }
}

impl Settings {
    /// Default cadence with a custom retry policy
    pub fn with_retry_config(max_retries: u32, retry_delay_ms: u64) -> Self {
        Self {
            max_retries,
            retry_delay_ms,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}
