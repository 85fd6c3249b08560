//! Per-queue NIC statistics
//!
//! Drivers expose per-queue counters as a flat list of free-form names such as
//! `rx-2.rx_packets` or `tx_queue_0_bytes`. This module decodes those names
//! into a dense `(queue, slot)` layout and turns successive samples into
//! per-interval deltas.
//!
//! ## Module Organization
//!
//! - `registry`: driver name -> counter-name pattern lookup
//! - `drivers`: the built-in, declarative driver table
//! - `parser`: counter name -> `(queue, slot)` decoding
//! - `index`: raw counter position -> dense queue slot mapping
//! - `engine`: double-buffered delta and total computation
//! - `collector`: startup discovery and per-tick sampling against a stats source
//! - `stats`: slot, sample and snapshot types
//! - `errors`: error taxonomy
//! - `formatting`: display helpers
//!
//! ## Usage
//!
//! ```no_run
//! use ethq_watcher::collectors::platform::create_stats_source;
//! use ethq_watcher::collectors::queues::{QueueCollector, Registry};
//! use ethq_watcher::settings::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::builtin()?;
//! let source = create_stats_source("eth0")?;
//! let mut collector = QueueCollector::open(source, &registry, Settings::default())?;
//! let snapshot = collector.collect()?;
//! println!("{} queues, total {:?}", snapshot.queue_count(), snapshot.total);
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod drivers;
pub mod engine;
pub mod errors;
pub mod formatting;
pub mod index;
pub mod parser;
pub mod registry;
pub mod stats;

pub use collector::QueueCollector;
pub use engine::DeltaEngine;
pub use errors::{QueueError, QueueResult};
pub use index::QueueIndexMap;
pub use parser::{parse, ParsedEntry};
pub use registry::{CaptureRoles, DriverPattern, Fallback, Registry, RoleSource};
pub use stats::{CounterKind, Direction, QueueDelta, QueueSample, QueueSnapshot, Slot};

#[cfg(test)]
pub mod tests;
