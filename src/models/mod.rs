//! Data models for the L1 suites
//!
//! Suite and case descriptors, and the results a run produces.

pub(crate) mod suite;
mod test_result;

pub use suite::{case_matches, Precondition, Registry, Suite, TestCase};
pub use test_result::{RunSummary, StatusCounts, SuiteSummary, TestResult, TestStatus};
