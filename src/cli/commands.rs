use clap::Parser;

/// Main CLI structure for the ethq application
/// Uses clap's derive macros for automatic CLI generation
#[derive(Parser, Debug)]
#[command(name = "ethq")]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "Live per-queue NIC packet and byte rates from ethtool statistics")]
#[command(long_about = "Displays a live table of per-queue TX/RX packet and byte deltas for one network \
interface, refreshed every second, with interval totals and throughput in Gbps. Queue counters are \
decoded from the driver's ethtool statistic names; supported drivers include sfc, i40e, iavf, ixgbe, \
igb, igc, ice, virtio_net, mlx5_core, mlx4_en, ena and bnxt_en.\n\n\
Press 'q' to exit.\n\n\
Examples:\n  \
ethq eth0                             # Monitor the queues of eth0")]
pub struct Cli {
    /// Network interface whose queues to monitor
    #[arg(value_name = "INTERFACE", help = "Network interface to monitor (e.g. eth0)")]
    pub interface: String,
}
