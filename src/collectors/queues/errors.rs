//! Error types for queue statistics collection
//!
//! Every failure the core can surface maps to one variant here. All of them are
//! fatal to a run; callers decide whether to report or retry.

use log::error;
use std::io;
use thiserror::Error;

use crate::collectors::queues::stats::Slot;

/// Result type alias for queue collection operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur while discovering or sampling per-queue counters
#[derive(Debug, Error)]
pub enum QueueError {
    /// Per-queue statistics are only available through ethtool on Linux
    #[error("Unsupported platform: per-queue NIC statistics require Linux ethtool support")]
    UnsupportedPlatform,

    /// Interface name cannot be passed to the kernel
    #[error("Invalid interface name '{interface}'")]
    InvalidInterfaceName { interface: String },

    #[error("Interface '{interface}' not found")]
    InterfaceNotFound { interface: String },

    #[error("Permission denied reading statistics for '{interface}'")]
    PermissionDenied { interface: String },

    /// Any other failure of the statistics source
    #[error("{operation} failed for '{interface}'")]
    Ioctl {
        interface: String,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// A driver pattern failed to compile or assigns capture roles inconsistently
    #[error("Invalid counter pattern for driver '{driver}': {message}")]
    InvalidPattern { driver: String, message: String },

    /// The embedded driver table could not be loaded
    #[error("Invalid driver table: {message}")]
    InvalidDriverTable { message: String },

    /// No counter name matched the selected driver pattern
    #[error("No NIC queues found on '{interface}' (driver '{driver}')")]
    NoQueues { interface: String, driver: String },

    /// A decoded queue number is beyond what any NIC exposes
    #[error("Counter name #{source_index} decodes to queue {queue}, above the limit of {max}")]
    QueueOutOfRange {
        source_index: usize,
        queue: usize,
        max: usize,
    },

    /// Two counter names decode to the same queue and slot
    #[error(
        "Counter names #{first} and #{second} both map to queue {queue} {slot:?}; the driver pattern is ambiguous"
    )]
    DuplicateSlot {
        queue: usize,
        slot: Slot,
        first: usize,
        second: usize,
    },

    /// The source returned fewer counters than the startup name list promised
    #[error("Statistics source returned {actual} counters, expected at least {expected}")]
    CounterCountMismatch { expected: usize, actual: usize },

    /// Reading counters kept failing after all retries
    #[error("Failed to read counters after {retry_attempts} retries: {message}")]
    FetchFailed { message: String, retry_attempts: u32 },
}

impl QueueError {
    /// Whether retrying the same fetch could plausibly succeed
    ///
    /// A driver reset briefly removes the interface, so `InterfaceNotFound` counts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueueError::Ioctl { .. } | QueueError::InterfaceNotFound { .. }
        )
    }
}

/// Renders an error and its sources on one line, outermost first
pub fn error_chain(error: &QueueError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Logs a structured error event for a failed collection
pub fn log_error_event(error: &QueueError, context: &str, collection_count: u64) {
    error!(
        "queue_collection_error: context={}, collection={}, retryable={}, error={}",
        context,
        collection_count,
        error.is_retryable(),
        error_chain(error)
    );
}
