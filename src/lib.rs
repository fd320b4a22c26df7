// University Budget Dashboard - Core Library
// Exposes all modules for use in the dashboard, CLI, API server, and tests

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod store;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use error::{BudgetError, BudgetResult};
pub use export::{to_csv_string, write_csv_file, CSV_HEADER, EXPORT_FILE_NAME};
pub use format::{axis_tick, format_tk, format_tk_opt};
pub use metrics::{chart_points, per_student, summary, ChartPoint, SummaryLine};
pub use record::{coerce_amount, coerce_count, BudgetRecord, Field};
pub use store::{default_records, RecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
