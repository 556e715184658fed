//! Services module for pos-service.

pub mod database;
pub mod metrics;
pub mod reports;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use reports::{PgReports, ReportSource};
