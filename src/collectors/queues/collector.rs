//! Per-queue statistics collector
//!
//! Ties the pieces together for one interface: selects the driver pattern,
//! builds the queue index from the counter names once, seeds the delta engine,
//! and then produces one [`QueueSnapshot`] per call to [`QueueCollector::collect`].

use log::{debug, error, info, trace, warn};
use std::thread;
use std::time::Instant;

use crate::collectors::platform::StatsSource;
use crate::collectors::queues::engine::DeltaEngine;
use crate::collectors::queues::errors::{error_chain, log_error_event, QueueError, QueueResult};
use crate::collectors::queues::index::QueueIndexMap;
use crate::collectors::queues::parser::parse;
use crate::collectors::queues::registry::Registry;
use crate::collectors::queues::stats::{QueueDelta, QueueSnapshot};
use crate::settings::Settings;

/// Samples one interface's per-queue counters and computes interval deltas
pub struct QueueCollector {
    source: Box<dyn StatsSource>,
    driver: String,
    pattern: String,
    counter_count: usize,
    engine: DeltaEngine,
    settings: Settings,
    collection_count: u64,
}

impl std::fmt::Debug for QueueCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueCollector")
            .field("interface", &self.source.interface())
            .field("driver", &self.driver)
            .field("pattern", &self.pattern)
            .field("queues", &self.engine.queue_count())
            .field("collection_count", &self.collection_count)
            .finish()
    }
}

impl QueueCollector {
    /// Discovers the queue layout and takes the baseline sample
    ///
    /// Fails if the driver exposes no counter the registry can decode.
    pub fn open(
        mut source: Box<dyn StatsSource>,
        registry: &Registry,
        settings: Settings,
    ) -> QueueResult<Self> {
        let interface = source.interface().to_string();
        let driver = source.driver_name()?;
        let pattern = registry.select(&driver);

        if pattern.is_null() {
            warn!(
                "Driver '{}' on '{}' has no registered counter pattern (supported: {})",
                driver,
                interface,
                registry.drivers().join(", ")
            );
        }

        let names = source.counter_names()?;
        let entries = parse(pattern, &names);
        let index = QueueIndexMap::build(&entries)?;

        info!(
            "Interface '{}' driver '{}' pattern '{}': {} counters, {} per-queue, {} queues",
            interface,
            driver,
            pattern.name(),
            names.len(),
            entries.len(),
            index.queue_count()
        );

        if index.queue_count() == 0 {
            return Err(QueueError::NoQueues { interface, driver });
        }

        let seed = source.read_counters()?;
        let engine = DeltaEngine::new(index, &seed)?;

        Ok(Self {
            source,
            driver,
            pattern: pattern.name().to_string(),
            counter_count: names.len(),
            engine,
            settings,
            collection_count: 0,
        })
    }

    /// Reads the counters once and returns the deltas since the last call
    pub fn collect(&mut self) -> QueueResult<QueueSnapshot> {
        let collection_start = Instant::now();
        self.collection_count += 1;

        let raw = match self.read_counters_with_retry() {
            Ok(raw) => raw,
            Err(e) => {
                log_error_event(&e, "counter_read_failure", self.collection_count);
                return Err(e);
            }
        };

        if raw.len() != self.counter_count {
            debug!(
                "Counter count changed on '{}' for collection #{}: {} -> {}",
                self.source.interface(),
                self.collection_count,
                self.counter_count,
                raw.len()
            );
        }

        if let Err(e) = self.engine.update(&raw) {
            log_error_event(&e, "counter_projection_failure", self.collection_count);
            return Err(e);
        }

        trace!(
            "Collection #{} on '{}' completed in {:.3}ms",
            self.collection_count,
            self.source.interface(),
            collection_start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(self.engine.snapshot())
    }

    /// Reads the raw counters, retrying with exponential backoff
    fn read_counters_with_retry(&mut self) -> QueueResult<Vec<u64>> {
        let mut attempt = 0;

        loop {
            match self.source.read_counters() {
                Ok(raw) => {
                    if attempt > 0 {
                        info!(
                            "Counter read on '{}' succeeded after {} retries for collection #{}",
                            self.source.interface(),
                            attempt,
                            self.collection_count
                        );
                    }
                    return Ok(raw);
                }
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    let delay = self.settings.retry_delay(attempt);
                    warn!(
                        "Counter read attempt {}/{} on '{}' failed for collection #{} - retrying in {}ms: {}",
                        attempt + 1,
                        self.settings.max_retries + 1,
                        self.source.interface(),
                        self.collection_count,
                        delay.as_millis(),
                        e
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    error!(
                        "All {} counter read attempts on '{}' failed for collection #{}",
                        attempt + 1,
                        self.source.interface(),
                        self.collection_count
                    );
                    return Err(QueueError::FetchFailed {
                        message: error_chain(&e),
                        retry_attempts: attempt,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn interface(&self) -> &str {
        self.source.interface()
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Name of the counter pattern selected for the driver
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn queue_count(&self) -> usize {
        self.engine.queue_count()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn collection_count(&self) -> u64 {
        self.collection_count
    }

    pub fn deltas(&self) -> &[QueueDelta] {
        self.engine.deltas()
    }

    pub fn total(&self) -> &QueueDelta {
        self.engine.total()
    }
}
