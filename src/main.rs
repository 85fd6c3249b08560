use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use ethq_watcher::cli::Cli;
use ethq_watcher::collectors::{create_stats_source, queues::Registry, QueueCollector};
use ethq_watcher::dashboard::Dashboard;
use ethq_watcher::settings::Settings;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        debug!("Fatal: {err:?}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let registry = Registry::builtin().context("Failed to load the built-in driver table")?;
    debug!("Supported drivers: {}", registry.drivers().join(", "));

    let source = create_stats_source(&cli.interface)?;
    let collector = QueueCollector::open(source, &registry, Settings::default())?;

    let mut dashboard = Dashboard::new(collector);
    dashboard.run().await
}
