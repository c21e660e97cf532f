//! Test result models
//!
//! Results of individual cases and per-suite / per-run summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::suite::{CaseKind, Precondition, TestCase};

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of a single case
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub case_id: String,
    pub api: String,
    pub kind: CaseKind,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    /// `file:line` of the failed assertion
    pub location: Option<String>,
}

impl TestResult {
    fn new(suite: &str, case: &TestCase, status: TestStatus, duration_ms: u64) -> Self {
        Self {
            suite: suite.to_string(),
            case_id: case.id.clone(),
            api: case.api.to_string(),
            kind: case.kind,
            status,
            duration_ms,
            message: None,
            location: None,
        }
    }

    pub fn pass(suite: &str, case: &TestCase, duration_ms: u64) -> Self {
        Self::new(suite, case, TestStatus::Pass, duration_ms)
    }

    pub fn fail(suite: &str, case: &TestCase, duration_ms: u64, message: impl Into<String>) -> Self {
        Self::new(suite, case, TestStatus::Fail, duration_ms).with_message(message)
    }

    pub fn skip(suite: &str, case: &TestCase, reason: impl Into<String>) -> Self {
        Self::new(suite, case, TestStatus::Skip, 0).with_message(reason)
    }

    pub fn error(suite: &str, case: &TestCase, error: impl Into<String>) -> Self {
        Self::new(suite, case, TestStatus::Error, 0).with_message(error)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// `suite/case` identifier, unique within a run
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.suite, self.case_id)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.case_id,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl StatusCounts {
    pub fn count<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        let mut counts = Self::default();
        for result in results {
            counts.total += 1;
            match result.status {
                TestStatus::Pass => counts.passed += 1,
                TestStatus::Fail => counts.failed += 1,
                TestStatus::Skip => counts.skipped += 1,
                TestStatus::Error => counts.errors += 1,
            }
        }
        counts
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Results of one suite
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub suite: String,
    pub precondition: Precondition,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total_duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl SuiteSummary {
    pub fn new(suite: impl Into<String>, precondition: Precondition, results: Vec<TestResult>) -> Self {
        let counts = StatusCounts::count(&results);
        let total_duration_ms = results.iter().map(|r| r.duration_ms).sum();

        Self {
            suite: suite.into(),
            precondition,
            counts,
            total_duration_ms,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        self.counts.pass_rate()
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0 || self.counts.errors > 0
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.suite, self.precondition)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {}",
            self.counts.total,
            self.counts.passed,
            self.counts.failed,
            self.counts.skipped,
            self.counts.errors
        )
    }
}

/// Results of every suite in one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub backend: String,
    pub hal_version: Option<String>,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total_duration_ms: u64,
    pub suites: Vec<SuiteSummary>,
}

impl RunSummary {
    pub fn new(backend: impl Into<String>, suites: Vec<SuiteSummary>) -> Self {
        let counts = StatusCounts::count(suites.iter().flat_map(|s| s.results.iter()));
        let total_duration_ms = suites.iter().map(|s| s.total_duration_ms).sum();

        Self {
            backend: backend.into(),
            hal_version: None,
            counts,
            total_duration_ms,
            suites,
        }
    }

    pub fn with_hal_version(mut self, version: impl Into<String>) -> Self {
        self.hal_version = Some(version.into());
        self
    }

    pub fn results(&self) -> impl Iterator<Item = &TestResult> {
        self.suites.iter().flat_map(|s| s.results.iter())
    }

    pub fn pass_rate(&self) -> f64 {
        self.counts.pass_rate()
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0 || self.counts.errors > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suite in &self.suites {
            writeln!(f, "{suite}")?;
        }
        writeln!(
            f,
            "Backend: {} | HAL version: {}",
            self.backend,
            self.hal_version.as_deref().unwrap_or("unknown")
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str) -> TestCase {
        TestCase::positive(id, "wifi_getRadioChannel", "reads the channel", |_| Ok(()))
    }

    #[test]
    fn test_result_creation() {
        let result = TestResult::pass("L1 wifi-hal init", &case("channel"), 3);
        assert!(result.status.is_success());
        assert_eq!(result.api, "wifi_getRadioChannel");
        assert_eq!(result.qualified_id(), "L1 wifi-hal init/channel");
    }

    #[test]
    fn test_suite_summary() {
        let suite = "L1 wifi-hal init";
        let results = vec![
            TestResult::pass(suite, &case("a"), 1),
            TestResult::fail(suite, &case("b"), 2, "expected RETURN_OK"),
            TestResult::skip(suite, &case("c"), "skipped by configuration"),
        ];

        let summary = SuiteSummary::new(suite, Precondition::Init, results);
        assert_eq!(summary.counts.total, 3);
        assert_eq!(summary.counts.passed, 1);
        assert_eq!(summary.counts.failed, 1);
        assert_eq!(summary.counts.skipped, 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_run_summary_totals() {
        let a = SuiteSummary::new(
            "noinit",
            Precondition::NoInit,
            vec![TestResult::pass("noinit", &case("a"), 1)],
        );
        let b = SuiteSummary::new(
            "init",
            Precondition::Init,
            vec![
                TestResult::pass("init", &case("b"), 1),
                TestResult::error("init", &case("c"), "setup failed"),
            ],
        );

        let run = RunSummary::new("sim", vec![a, b]).with_hal_version("3.0");
        assert_eq!(run.counts.total, 3);
        assert_eq!(run.counts.errors, 1);
        assert_eq!(run.results().count(), 3);
        assert!((run.pass_rate() - 66.666).abs() < 0.1);
        assert!(run.has_failures());
    }

    #[test]
    fn test_display_includes_location() {
        let result = TestResult::fail("s", &case("x"), 0, "boom").with_location("src/suites/radio.rs:10");
        let text = result.to_string();
        assert!(text.contains("boom"));
        assert!(text.contains("radio.rs:10"));
    }
}
