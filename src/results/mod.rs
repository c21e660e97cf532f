//! Results storage and reporting module
//!
//! Persists runs, compares them, and renders reports.

mod compare;
mod report;
mod storage;

pub use compare::{ComparisonFormatter, RunComparator};
pub use report::{ReportFormat, ReportGenerator};
pub use storage::{ExportFormat, ResultsStorage, StoredRun};
