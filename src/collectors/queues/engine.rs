//! Delta engine
//!
//! Keeps the previous and current generation of per-queue samples and turns
//! each new raw counter array into per-queue deltas plus interval totals.

use chrono::Utc;
use log::trace;

use crate::collectors::queues::errors::QueueResult;
use crate::collectors::queues::index::QueueIndexMap;
use crate::collectors::queues::stats::{QueueDelta, QueueSample, QueueSnapshot};

/// Double-buffered per-queue delta computation
///
/// `previous`, `delta` and `total` are only ever written here.
#[derive(Debug)]
pub struct DeltaEngine {
    index: QueueIndexMap,
    previous: Vec<QueueSample>,
    current: Vec<QueueSample>,
    delta: Vec<QueueDelta>,
    total: QueueDelta,
    ticks: u64,
}

impl DeltaEngine {
    /// Creates an engine seeded with the first raw sample
    ///
    /// The seed is never reported as a delta; the first [`DeltaEngine::update`]
    /// measures against it.
    pub fn new(index: QueueIndexMap, seed: &[u64]) -> QueueResult<Self> {
        let queue_count = index.queue_count();
        let mut previous = Vec::with_capacity(queue_count);
        index.project_into(seed, &mut previous)?;

        Ok(Self {
            index,
            previous,
            current: Vec::with_capacity(queue_count),
            delta: vec![QueueDelta::default(); queue_count],
            total: QueueDelta::default(),
            ticks: 0,
        })
    }

    /// Folds one raw counter array into the deltas and totals
    ///
    /// On error nothing is modified, so the next successful update still
    /// measures against the last good sample.
    pub fn update(&mut self, raw: &[u64]) -> QueueResult<()> {
        self.index.project_into(raw, &mut self.current)?;

        self.total = QueueDelta::default();
        for ((delta, current), previous) in self
            .delta
            .iter_mut()
            .zip(&self.current)
            .zip(&self.previous)
        {
            *delta = QueueDelta::between(current, previous);
            self.total.accumulate(delta);
        }

        std::mem::swap(&mut self.previous, &mut self.current);
        self.ticks += 1;

        trace!(
            "Delta tick #{}: total={:?}",
            self.ticks,
            self.total.as_array()
        );

        Ok(())
    }

    pub fn queue_count(&self) -> usize {
        self.index.queue_count()
    }

    pub fn index(&self) -> &QueueIndexMap {
        &self.index
    }

    pub fn deltas(&self) -> &[QueueDelta] {
        &self.delta
    }

    pub fn total(&self) -> &QueueDelta {
        &self.total
    }

    /// Most recent projected sample
    pub fn latest(&self) -> &[QueueSample] {
        &self.previous
    }

    /// Number of completed updates
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            timestamp: Utc::now(),
            collection: self.ticks,
            deltas: self.delta.clone(),
            total: self.total,
        }
    }
}
