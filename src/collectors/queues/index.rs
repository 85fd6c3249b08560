//! Queue index map
//!
//! Maps positions in the raw counter array to `(queue, slot)` locations in the
//! dense per-queue table, and derives the number of queues.

use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::collectors::queues::errors::{QueueError, QueueResult};
use crate::collectors::queues::parser::{ParsedEntry, MAX_QUEUE};
use crate::collectors::queues::stats::{QueueSample, Slot};

/// Read-only projection from raw counter positions to queue slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueIndexMap {
    /// source index -> (queue, slot), ordered by source index
    locations: BTreeMap<usize, (usize, Slot)>,
    queue_count: usize,
}

impl QueueIndexMap {
    /// Builds the map from parser output
    ///
    /// Two entries landing on the same `(queue, slot)` mean the driver pattern
    /// is ambiguous; that is reported instead of letting one counter silently
    /// shadow the other. Queue numbers above [`MAX_QUEUE`] are refused. An
    /// empty entry list yields a map with zero queues, which callers must
    /// refuse before sampling.
    pub fn build(entries: &[ParsedEntry]) -> QueueResult<Self> {
        let mut locations = BTreeMap::new();
        let mut owners: HashMap<(usize, Slot), usize> = HashMap::new();
        let mut queue_count = 0;

        for entry in entries {
            let queue_end = entry
                .queue
                .checked_add(1)
                .filter(|_| entry.queue <= MAX_QUEUE)
                .ok_or(QueueError::QueueOutOfRange {
                    source_index: entry.source_index,
                    queue: entry.queue,
                    max: MAX_QUEUE,
                })?;

            if let Some(first) = owners.insert((entry.queue, entry.slot), entry.source_index) {
                return Err(QueueError::DuplicateSlot {
                    queue: entry.queue,
                    slot: entry.slot,
                    first,
                    second: entry.source_index,
                });
            }

            locations.insert(entry.source_index, (entry.queue, entry.slot));
            queue_count = queue_count.max(queue_end);
        }

        debug!(
            "Built queue index map: {} counters across {} queues",
            locations.len(),
            queue_count
        );

        Ok(Self {
            locations,
            queue_count,
        })
    }

    /// One plus the highest queue number seen, or zero
    pub fn queue_count(&self) -> usize {
        self.queue_count
    }

    /// Number of raw counters that feed a queue slot
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Smallest raw counter array length this map can project
    pub fn required_len(&self) -> usize {
        self.locations
            .keys()
            .next_back()
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    pub fn get(&self, source_index: usize) -> Option<(usize, Slot)> {
        self.locations.get(&source_index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Slot)> + '_ {
        self.locations
            .iter()
            .map(|(index, (queue, slot))| (*index, *queue, *slot))
    }

    /// Scatters `raw` into `samples`, one record per queue
    ///
    /// Slots no counter feeds are left at zero. `samples` is resized to the
    /// queue count.
    pub fn project_into(&self, raw: &[u64], samples: &mut Vec<QueueSample>) -> QueueResult<()> {
        let required = self.required_len();
        if raw.len() < required {
            return Err(QueueError::CounterCountMismatch {
                expected: required,
                actual: raw.len(),
            });
        }

        samples.clear();
        samples.resize(self.queue_count, QueueSample::default());

        for (index, queue, slot) in self.iter() {
            samples[queue][slot] = raw[index];
        }

        Ok(())
    }

    /// Convenience wrapper around [`QueueIndexMap::project_into`]
    pub fn project(&self, raw: &[u64]) -> QueueResult<Vec<QueueSample>> {
        let mut samples = Vec::with_capacity(self.queue_count);
        self.project_into(raw, &mut samples)?;
        Ok(samples)
    }
}
