//! Suite runner
//!
//! Runs suites in registration order against one HAL. Each suite's setup
//! establishes its precondition and its teardown leaves the HAL
//! uninitialized. A failed setup reports every case of the suite as an
//! error without running it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use super::context::{TestContext, TestFailure};
use crate::models::{case_matches, Registry, RunSummary, Suite, SuiteSummary, TestCase, TestResult};
use crate::utils::{Stopwatch, Timer};

/// Sequential runner over a registry of suites
pub struct SuiteRunner {
    ctx: TestContext,
    skip: Vec<String>,
    filter: Vec<String>,
    suites: Vec<String>,
    hal_version: Option<String>,
}

impl SuiteRunner {
    pub fn new(ctx: TestContext) -> Self {
        Self {
            ctx,
            skip: Vec::new(),
            filter: Vec::new(),
            suites: Vec::new(),
            hal_version: None,
        }
    }

    /// Report cases matching any of `patterns` as skipped
    pub fn with_skip<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Run only cases matching one of `patterns`
    pub fn with_filter<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Run only the named suite; may be given more than once
    pub fn with_suite(mut self, name: impl Into<String>) -> Self {
        self.suites.push(name.into());
        self
    }

    pub fn context(&mut self) -> &mut TestContext {
        &mut self.ctx
    }

    pub fn into_context(self) -> TestContext {
        self.ctx
    }

    fn suite_selected(&self, suite: &Suite) -> bool {
        self.suites.is_empty()
            || self
                .suites
                .iter()
                .any(|name| suite.name.eq_ignore_ascii_case(name))
    }

    fn case_selected(&self, suite: &Suite, case: &TestCase) -> bool {
        self.filter.is_empty()
            || self
                .filter
                .iter()
                .any(|pattern| case_matches(&suite.name, &case.id, pattern))
    }

    fn case_skipped(&self, suite: &Suite, case: &TestCase) -> bool {
        self.skip
            .iter()
            .any(|pattern| case_matches(&suite.name, &case.id, pattern))
    }

    /// Run every selected suite, leaving the HAL uninitialized
    pub fn run_all(&mut self, registry: &Registry) -> RunSummary {
        let selected: Vec<&Suite> = registry
            .suites()
            .iter()
            .filter(|s| self.suite_selected(s))
            .collect();
        info!(
            "Running {} suites against the {} HAL",
            selected.len(),
            self.ctx.backend()
        );

        let mut stopwatch = Stopwatch::new();
        let mut summaries = Vec::new();
        for suite in selected {
            summaries.push(self.run_suite(suite));
            stopwatch.lap(suite.name.as_str());
        }
        self.ctx.shutdown();
        debug!("Suite timings:\n{}", stopwatch.format());

        let mut summary = RunSummary::new(self.ctx.backend(), summaries);
        if let Some(version) = &self.hal_version {
            summary = summary.with_hal_version(version.clone());
        }

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.total_duration_ms,
            summary.counts.passed,
            summary.counts.total,
            summary.pass_rate()
        );
        summary
    }

    pub fn run_suite(&mut self, suite: &Suite) -> SuiteSummary {
        let cases: Vec<&TestCase> = suite
            .cases
            .iter()
            .filter(|c| self.case_selected(suite, c))
            .collect();
        self.run_cases(suite, &cases)
    }

    /// Run one case of `suite` with the suite's setup and teardown around it
    pub fn run_one(&mut self, suite: &Suite, case: &TestCase) -> TestResult {
        let mut summary = self.run_cases(suite, &[case]);
        summary
            .results
            .pop()
            .unwrap_or_else(|| TestResult::error(&suite.name, case, "case produced no result"))
    }

    fn run_cases(&mut self, suite: &Suite, cases: &[&TestCase]) -> SuiteSummary {
        info!("=== {} ({}) ===", suite.name, suite.precondition);
        self.ctx.set_precondition(suite.precondition);
        let results = match self.ctx.restore_precondition() {
            Ok(()) => {
                self.read_hal_version();
                cases
                    .iter()
                    .map(|case| self.run_case(suite, case))
                    .collect()
            }
            Err(failure) => {
                error!("Setup of {} failed: {}", suite.name, failure);
                cases
                    .iter()
                    .map(|case| setup_error(suite, case, &failure))
                    .collect()
            }
        };

        if let Err(failure) = self.ctx.enter_uninitialized() {
            warn!("Teardown of {} failed: {}", suite.name, failure);
        }

        let summary = SuiteSummary::new(suite.name.as_str(), suite.precondition, results);
        info!(
            "{}: {}/{} passed ({:.1}%)",
            suite.name,
            summary.counts.passed,
            summary.counts.total,
            summary.pass_rate()
        );
        summary
    }

    pub fn run_case(&mut self, suite: &Suite, case: &TestCase) -> TestResult {
        if self.case_skipped(suite, case) {
            let result = TestResult::skip(&suite.name, case, "skipped by configuration");
            info!("  {}", result);
            return result;
        }
        if let Err(failure) = self.ensure_precondition(suite) {
            let result = TestResult::error(
                &suite.name,
                case,
                format!("precondition {} not established: {}", suite.precondition, failure.message),
            )
            .with_location(failure.location);
            info!("  {}", result);
            return result;
        }

        debug!("Running {} ({})", case.id, case.description);
        let timer = Timer::start(case.id.as_str());
        let func = case.func.clone();
        let ctx = &mut self.ctx;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| func(ctx)));
        let elapsed = timer.stop();

        let result = match outcome {
            Ok(Ok(())) => TestResult::pass(&suite.name, case, elapsed),
            Ok(Err(failure)) => TestResult::fail(&suite.name, case, elapsed, failure.message)
                .with_location(failure.location),
            Err(payload) => {
                error!("{} panicked", case.id);
                TestResult::error(
                    &suite.name,
                    case,
                    format!("case panicked: {}", panic_message(payload.as_ref())),
                )
                .with_duration(elapsed)
            }
        };

        if let Err(failure) = self.ensure_precondition(suite) {
            warn!("{} left the HAL unrecoverable: {}", case.id, failure);
        }
        info!("  {}", result);
        result
    }

    /// Restore the suite's precondition if a case changed the HAL state
    fn ensure_precondition(&mut self, suite: &Suite) -> Result<(), TestFailure> {
        let state = self.ctx.state();
        if state == suite.precondition {
            return Ok(());
        }
        warn!(
            "HAL is in state {}, restoring {} for {}",
            state, suite.precondition, suite.name
        );
        self.ctx.restore_precondition()
    }

    fn read_hal_version(&mut self) {
        if self.hal_version.is_some() || !self.ctx.state().initialized() {
            return;
        }
        let mut version = String::new();
        if self.ctx.hal().get_hal_version(Some(&mut version)).is_ok() {
            info!("HAL version {}", version);
            self.hal_version = Some(version);
        }
    }
}

fn setup_error(suite: &Suite, case: &TestCase, failure: &TestFailure) -> TestResult {
    TestResult::error(
        &suite.name,
        case,
        format!("suite setup failed: {}", failure.message),
    )
    .with_location(failure.location.clone())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::executor::expect;
    use crate::hal::{HalStatus, SimHal};
    use crate::models::{Precondition, TestStatus};

    fn runner(fixtures: Fixtures) -> SuiteRunner {
        SuiteRunner::new(TestContext::new(Box::new(SimHal::new()), fixtures))
    }

    fn suite(precondition: Precondition) -> Suite {
        let mut suite = Suite::new("L1 sample", precondition);
        suite
            .add(TestCase::positive("passes", "wifi_getHalVersion", "", |ctx| {
                let mut version = String::new();
                expect(ctx.hal().get_hal_version(Some(&mut version)).is_ok(), "no version")
            }))
            .add(TestCase::negative("fails", "wifi_init", "", |_| {
                expect(false, "deliberate")
            }))
            .add(TestCase::negative("panics", "wifi_init", "", |_| {
                panic!("boom");
            }))
            .add(TestCase::positive("uninits", "wifi_uninit", "", |ctx| {
                expect(ctx.uninit() == HalStatus::Ok, "uninit failed")
            }))
            .add(TestCase::positive("sees_restored_state", "wifi_getHalVersion", "", |ctx| {
                expect(ctx.state() == Precondition::Init, "state not restored")
            }));
        suite
    }

    #[test]
    fn test_run_suite_statuses() {
        let mut runner = runner(Fixtures::example());
        let summary = runner.run_suite(&suite(Precondition::Init));

        let statuses: Vec<TestStatus> = summary.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TestStatus::Pass,
                TestStatus::Fail,
                TestStatus::Error,
                TestStatus::Pass,
                TestStatus::Pass,
            ]
        );
        let failed = &summary.results[1];
        assert_eq!(failed.message.as_deref(), Some("deliberate"));
        assert!(failed.location.as_deref().unwrap_or("").contains("runner.rs"));
        assert!(summary.results[2].message.as_deref().unwrap_or("").contains("boom"));
        assert_eq!(runner.context().state(), Precondition::NoInit);
    }

    #[test]
    fn test_skip_and_filter() {
        let mut runner = runner(Fixtures::example())
            .with_skip(["fails"])
            .with_filter(["passes", "fails"]);
        let summary = runner.run_suite(&suite(Precondition::Init));
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[1].status, TestStatus::Skip);
    }

    #[test]
    fn test_setup_failure_reports_errors() {
        let mut runner = runner(Fixtures::default());
        let summary = runner.run_suite(&suite(Precondition::InitWithConfig));
        assert!(summary.results.iter().all(|r| r.status == TestStatus::Error));
        assert!(summary.results[0]
            .message
            .as_deref()
            .unwrap_or("")
            .contains("fixture value missing: interface"));
    }

    #[test]
    fn test_run_all_selects_suites() {
        let mut registry = Registry::new();
        registry.add_suite(suite(Precondition::Init));
        let mut other = Suite::new("L1 other", Precondition::NoInit);
        other.add(TestCase::positive("noop", "wifi_init", "", |_| Ok(())));
        registry.add_suite(other);

        let mut runner = runner(Fixtures::example()).with_suite("l1 other");
        let summary = runner.run_all(&registry);
        assert_eq!(summary.suites.len(), 1);
        assert_eq!(summary.counts.passed, 1);
        assert!(summary.hal_version.is_none());
    }

    #[test]
    fn test_run_one() {
        let mut runner = runner(Fixtures::example());
        let suite = suite(Precondition::Init);
        let case = suite.case("sees_restored_state").unwrap();
        let result = runner.run_one(&suite, case);
        assert_eq!(result.status, TestStatus::Pass);
        assert_eq!(runner.context().state(), Precondition::NoInit);
    }

    #[test]
    fn test_run_all_reads_hal_version() {
        let mut registry = Registry::new();
        registry.add_suite(suite(Precondition::Init));
        let summary = runner(Fixtures::example()).run_all(&registry);
        assert_eq!(summary.hal_version.as_deref(), Some("3.0"));
        assert_eq!(summary.backend, "sim");
    }
}
