//! Formatting utilities for queue deltas
//!
//! Helpers shared by the dashboard for turning per-interval counter deltas
//! into display strings.

use std::time::Duration;

/// Converts a byte delta over `interval` into gigabits per second
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ethq_watcher::collectors::queues::formatting::throughput_gbps;
///
/// assert_eq!(throughput_gbps(125_000_000, Duration::from_secs(1)), 1.0);
/// assert_eq!(throughput_gbps(125_000_000, Duration::from_secs(2)), 0.5);
/// ```
pub fn throughput_gbps(bytes: i64, interval: Duration) -> f64 {
    let seconds = interval.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    8.0 * bytes as f64 / 1e9 / seconds
}

/// Formats a throughput value the way the totals row shows it
pub fn format_gbps(gbps: f64) -> String {
    format!("{:.3}", gbps)
}

/// Formats a counter delta right-aligned in a 12 character column
pub fn format_count(count: i64) -> String {
    format!("{:>12}", count)
}
