pub mod platform;
pub mod queues;

pub use platform::{create_stats_source, StatsSource};
pub use queues::QueueCollector;
