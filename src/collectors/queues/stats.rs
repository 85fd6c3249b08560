//! Per-queue counter records
//!
//! This module contains the fixed four-slot records the delta engine works on,
//! along with the direction and counter-kind vocabulary the name parser produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Traffic direction encoded in a counter name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    /// Decodes the literal direction text captured from a counter name
    pub fn from_literal(text: &str) -> Option<Self> {
        match text {
            "tx" => Some(Direction::Tx),
            "rx" => Some(Direction::Rx),
            _ => None,
        }
    }
}

/// Counter kind encoded in a counter name
///
/// Anything that is not a byte counter lands in the packets lane, so drivers
/// that call it `cnt` or `pkts` need no special handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Packets,
    Bytes,
}

impl CounterKind {
    pub fn from_literal(text: &str) -> Self {
        if text == "bytes" {
            CounterKind::Bytes
        } else {
            CounterKind::Packets
        }
    }
}

/// One of the four counters tracked for every queue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    TxPackets,
    RxPackets,
    TxBytes,
    RxBytes,
}

impl Slot {
    /// All slots in display order
    pub const ALL: [Slot; 4] = [Slot::TxPackets, Slot::RxPackets, Slot::TxBytes, Slot::RxBytes];

    pub fn new(direction: Direction, kind: CounterKind) -> Self {
        match (direction, kind) {
            (Direction::Tx, CounterKind::Packets) => Slot::TxPackets,
            (Direction::Rx, CounterKind::Packets) => Slot::RxPackets,
            (Direction::Tx, CounterKind::Bytes) => Slot::TxBytes,
            (Direction::Rx, CounterKind::Bytes) => Slot::RxBytes,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Slot::TxPackets | Slot::TxBytes => Direction::Tx,
            Slot::RxPackets | Slot::RxBytes => Direction::Rx,
        }
    }

    pub fn kind(self) -> CounterKind {
        match self {
            Slot::TxPackets | Slot::RxPackets => CounterKind::Packets,
            Slot::TxBytes | Slot::RxBytes => CounterKind::Bytes,
        }
    }

    fn position(self) -> usize {
        match self {
            Slot::TxPackets => 0,
            Slot::RxPackets => 1,
            Slot::TxBytes => 2,
            Slot::RxBytes => 3,
        }
    }
}

/// Four counters of one queue, indexed by [`Slot`]
///
/// Used with `u64` for raw samples and with `i64` for deltas and totals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueCounters<T> {
    counts: [T; 4],
}

impl<T: Copy> QueueCounters<T> {
    pub fn from_array(counts: [T; 4]) -> Self {
        Self { counts }
    }

    pub fn as_array(&self) -> [T; 4] {
        self.counts
    }
}

impl<T> Index<Slot> for QueueCounters<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &T {
        &self.counts[slot.position()]
    }
}

impl<T> IndexMut<Slot> for QueueCounters<T> {
    fn index_mut(&mut self, slot: Slot) -> &mut T {
        &mut self.counts[slot.position()]
    }
}

/// Raw counter sample for one queue
pub type QueueSample = QueueCounters<u64>;

/// Signed per-interval change for one queue, or the sum over all queues
pub type QueueDelta = QueueCounters<i64>;

impl QueueDelta {
    /// Signed difference of two samples
    ///
    /// Counters are unsigned, but the difference is reinterpreted as signed so a
    /// counter reset shows up as a negative value for one interval instead of
    /// a huge positive one.
    pub fn between(current: &QueueSample, previous: &QueueSample) -> Self {
        let mut delta = QueueDelta::default();
        for slot in Slot::ALL {
            delta[slot] = current[slot].wrapping_sub(previous[slot]) as i64;
        }
        delta
    }

    /// Adds another delta slot by slot
    pub fn accumulate(&mut self, other: &QueueDelta) {
        for slot in Slot::ALL {
            self[slot] = self[slot].wrapping_add(other[slot]);
        }
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|count| *count == 0)
    }
}

/// Result of one sampling interval, handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// UTC timestamp of the sample the deltas end at
    pub timestamp: DateTime<Utc>,
    /// Sequence number of the tick that produced this snapshot
    pub collection: u64,
    /// Per-queue deltas, indexed by queue number
    pub deltas: Vec<QueueDelta>,
    /// Sum of `deltas` per slot
    pub total: QueueDelta,
}

impl QueueSnapshot {
    pub fn queue_count(&self) -> usize {
        self.deltas.len()
    }
}
