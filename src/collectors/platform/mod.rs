use log::debug;

use crate::collectors::queues::errors::{QueueError, QueueResult};

// Platform-specific NIC statistics sources
// Only Linux exposes per-queue driver counters through a stable interface (ethtool)

/// Linux ethtool statistics source
/// Uses SIOCETHTOOL ioctls on a datagram socket; no special capabilities needed for reading
#[cfg(target_os = "linux")]
pub mod linux;

/// Source of per-interface driver statistics
///
/// The counter name list is fixed for the lifetime of a driver binding, and
/// `read_counters` returns values in the same order.
pub trait StatsSource: Send {
    /// Interface this source reads from
    fn interface(&self) -> &str;

    /// Name of the driver bound to the interface (e.g. `sfc`, `ixgbe`)
    fn driver_name(&mut self) -> QueueResult<String>;

    /// Ordered statistic names
    fn counter_names(&mut self) -> QueueResult<Vec<String>>;

    /// Current statistic values, same order as `counter_names`
    fn read_counters(&mut self) -> QueueResult<Vec<u64>>;
}

pub fn create_stats_source(interface: &str) -> QueueResult<Box<dyn StatsSource>> {
    debug!("Opening statistics source for interface '{}'", interface);
    validate_interface_name(interface)?;

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::EthtoolSource::open(interface)?))
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(QueueError::UnsupportedPlatform)
    }
}

/// Checks the interface name before handing it to the kernel
pub fn validate_interface_name(interface: &str) -> QueueResult<()> {
    // IFNAMSIZ includes the trailing NUL
    const MAX_INTERFACE_NAME: usize = 15;

    if interface.is_empty()
        || interface.len() > MAX_INTERFACE_NAME
        || interface.contains(['/', '\0'])
        || interface.chars().any(char::is_whitespace)
    {
        return Err(QueueError::InvalidInterfaceName {
            interface: interface.to_string(),
        });
    }
    Ok(())
}
