//! Terminal presentation of per-queue deltas

pub mod live_dashboard;

pub use live_dashboard::{table_rows, Dashboard, DashboardView, TableRow};
