//! Tests for core collector functionality
//!
//! This module contains unit tests for the QueueCollector struct: startup
//! discovery, per-tick deltas and the retry policy.

#[cfg(test)]
mod tests {
    use crate::collectors::queues::collector::QueueCollector;
    use crate::collectors::queues::errors::QueueError;
    use crate::collectors::queues::registry::Registry;
    use crate::collectors::queues::stats::Slot;
    use crate::collectors::queues::tests::{interface_gone, ScriptedSource};
    use crate::settings::Settings;

    const SFC_NAMES: [&str; 5] = [
        "tx-0.tx_packets",
        "tx-0.tx_bytes",
        "rx-0.rx_packets",
        "rx-0.rx_bytes",
        "port_rx_bytes",
    ];

    fn no_wait() -> Settings {
        Settings::with_retry_config(2, 0)
    }

    #[test]
    fn test_open_discovers_queues() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES).then_read(&[0, 0, 0, 0, 0]);

        let collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        assert_eq!(collector.queue_count(), 1);
        assert_eq!(collector.driver(), "sfc");
        assert_eq!(collector.pattern(), "sfc");
        assert_eq!(collector.interface(), "test0");
        assert_eq!(collector.collection_count(), 0);
    }

    #[test]
    fn test_collect_reports_deltas() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[100, 200, 10, 20, 9999])
            .then_read(&[150, 260, 15, 40, 0]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        let snapshot = collector.collect().unwrap();

        assert_eq!(snapshot.collection, 1);
        assert_eq!(snapshot.deltas[0].as_array(), [50, 5, 60, 20]);
        assert_eq!(snapshot.total[Slot::TxBytes], 60);
        assert_eq!(collector.total()[Slot::RxBytes], 20);
        assert_eq!(collector.deltas().len(), 1);
    }

    #[test]
    fn test_unsupported_driver_has_no_queues() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("e1000", &SFC_NAMES).then_read(&[0; 5]);

        let result = QueueCollector::open(Box::new(source), &registry, no_wait());
        match result {
            Err(QueueError::NoQueues { interface, driver }) => {
                assert_eq!(interface, "test0");
                assert_eq!(driver, "e1000");
            }
            other => panic!("expected NoQueues, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_names_fail_startup() {
        let registry = Registry::builtin().unwrap();
        // iavf decodes both spellings, so listing both is a conflict
        let source = ScriptedSource::new("iavf", &["tx-0.bytes", "tx-0.tx_bytes"]).then_read(&[0, 0]);

        let result = QueueCollector::open(Box::new(source), &registry, no_wait());
        assert!(matches!(
            result,
            Err(QueueError::DuplicateSlot {
                queue: 0,
                slot: Slot::TxBytes,
                first: 0,
                second: 1
            })
        ));
    }

    #[test]
    fn test_retry_recovers() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[0; 5])
            .then_fail(interface_gone())
            .then_read(&[1, 2, 3, 4, 5]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        let snapshot = collector.collect().unwrap();
        assert_eq!(snapshot.deltas[0].as_array(), [1, 3, 2, 4]);
    }

    #[test]
    fn test_retry_exhaustion_fails() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[0; 5])
            .then_fail(interface_gone())
            .then_fail(interface_gone())
            .then_fail(interface_gone());

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        match collector.collect() {
            Err(QueueError::FetchFailed { retry_attempts, .. }) => assert_eq!(retry_attempts, 2),
            other => panic!("expected FetchFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_permission_error_is_not_retried() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[0; 5])
            .then_fail(QueueError::PermissionDenied {
                interface: "test0".to_string(),
            })
            .then_read(&[1; 5]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        assert!(matches!(
            collector.collect(),
            Err(QueueError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_shrunk_counter_list_is_fatal() {
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[0; 5])
            .then_read(&[1, 2]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        assert!(matches!(
            collector.collect(),
            Err(QueueError::CounterCountMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_i40e_current_names_discover_queues() {
        let registry = Registry::builtin().unwrap();
        let names = [
            "rx_bytes",
            "tx-0.packets",
            "tx-0.bytes",
            "rx-0.packets",
            "rx-0.bytes",
            "tx-1.packets",
            "tx-1.bytes",
            "rx-1.packets",
            "rx-1.bytes",
        ];
        let source = ScriptedSource::new("i40e", &names)
            .then_read(&[0; 9])
            .then_read(&[500, 1, 100, 2, 200, 3, 300, 4, 400]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        assert_eq!(collector.queue_count(), 2);

        let snapshot = collector.collect().unwrap();
        assert_eq!(snapshot.deltas[0].as_array(), [1, 2, 100, 200]);
        assert_eq!(snapshot.deltas[1].as_array(), [3, 4, 300, 400]);
    }

    #[test]
    fn test_oversized_queue_number_is_ignored() {
        let registry = Registry::builtin().unwrap();
        let names = [
            "rx-0.rx_bytes",
            "rx-1.rx_packets",
            "rx-18446744073709551615.rx_packets",
            "rx-4000000000.rx_bytes",
        ];
        let source = ScriptedSource::new("sfc", &names)
            .then_read(&[0; 4])
            .then_read(&[10, 20, 30, 40]);

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        assert_eq!(collector.queue_count(), 2);

        let snapshot = collector.collect().unwrap();
        assert_eq!(snapshot.deltas[0][Slot::RxBytes], 10);
        assert_eq!(snapshot.deltas[1][Slot::RxPackets], 20);
    }

    #[test]
    fn test_exhausted_ioctl_failure_keeps_os_error() {
        let busy = || QueueError::Ioctl {
            interface: "test0".to_string(),
            operation: "ETHTOOL_GSTATS",
            source: std::io::Error::other("device busy"),
        };
        let registry = Registry::builtin().unwrap();
        let source = ScriptedSource::new("sfc", &SFC_NAMES)
            .then_read(&[0; 5])
            .then_fail(busy())
            .then_fail(busy())
            .then_fail(busy());

        let mut collector = QueueCollector::open(Box::new(source), &registry, no_wait()).unwrap();
        match collector.collect() {
            Err(QueueError::FetchFailed { message, .. }) => {
                assert_eq!(message, "ETHTOOL_GSTATS failed for 'test0': device busy");
            }
            other => panic!("expected FetchFailed, got {:?}", other),
        }
    }
}
