//! Test module organization for queue collection
//!
//! Cross-module tests that drive the collector through a scripted statistics
//! source instead of a real NIC.

pub mod collector_tests;

use std::collections::VecDeque;

use crate::collectors::platform::StatsSource;
use crate::collectors::queues::errors::{QueueError, QueueResult};

/// In-memory statistics source that replays a fixed list of reads
pub struct ScriptedSource {
    pub driver: String,
    pub names: Vec<String>,
    pub reads: VecDeque<QueueResult<Vec<u64>>>,
}

impl ScriptedSource {
    pub fn new(driver: &str, names: &[&str]) -> Self {
        Self {
            driver: driver.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            reads: VecDeque::new(),
        }
    }

    pub fn then_read(mut self, values: &[u64]) -> Self {
        self.reads.push_back(Ok(values.to_vec()));
        self
    }

    pub fn then_fail(mut self, error: QueueError) -> Self {
        self.reads.push_back(Err(error));
        self
    }
}

impl StatsSource for ScriptedSource {
    fn interface(&self) -> &str {
        "test0"
    }

    fn driver_name(&mut self) -> QueueResult<String> {
        Ok(self.driver.clone())
    }

    fn counter_names(&mut self) -> QueueResult<Vec<String>> {
        Ok(self.names.clone())
    }

    fn read_counters(&mut self) -> QueueResult<Vec<u64>> {
        self.reads.pop_front().unwrap_or_else(|| {
            Err(QueueError::InterfaceNotFound {
                interface: "test0".to_string(),
            })
        })
    }
}

pub fn interface_gone() -> QueueError {
    QueueError::InterfaceNotFound {
        interface: "test0".to_string(),
    }
}
