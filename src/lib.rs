//! Per-queue NIC statistics monitor
//!
//! Reads a network driver's ethtool statistics, decodes the driver-specific
//! counter names into `(queue, slot)` form and reports per-interval deltas.

pub mod cli;
pub mod collectors;
pub mod dashboard;
pub mod settings;
