//! L1 suites for the WiFi HAL
//!
//! Cases are grouped by the HAL state their suite's setup establishes:
//!
//! - `L1 wifi-hal noinit`: lifecycle cases, and every entry point called
//!   before `wifi_init`
//! - `L1 wifi-hal init`: positive and negative cases per entry point after
//!   `wifi_init`
//! - `L1 wifi-hal initWithConfig`: cases that depend on the configured
//!   interface, after `wifi_initWithConfig`

mod client;
mod lifecycle;
mod radio;
mod ssid;
pub mod validate;

use std::sync::Arc;

use crate::executor::{expect, expect_status, TestContext, TestFailure};
use crate::hal::HalStatus;
use crate::models::{Precondition, Registry, Suite, TestCase};

pub const NOINIT_SUITE: &str = "L1 wifi-hal noinit";
pub const INIT_SUITE: &str = "L1 wifi-hal init";
pub const INIT_WITH_CONFIG_SUITE: &str = "L1 wifi-hal initWithConfig";

type ProbeFn = Arc<dyn Fn(&mut TestContext) -> HalStatus + Send + Sync>;
type ArmFn = Arc<dyn Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync>;
type DisarmFn = Arc<dyn Fn(&mut TestContext) + Send + Sync>;

/// A status-returning entry point called with arguments that would be
/// valid on an initialized HAL
#[derive(Clone)]
pub(crate) struct ApiProbe {
    pub api: &'static str,
    pub call: ProbeFn,
    /// Brings the HAL into the state in which `call` succeeds when served
    arm: Option<ArmFn>,
    /// Undoes what `arm` left behind
    disarm: Option<DisarmFn>,
}

impl ApiProbe {
    pub fn new<F>(api: &'static str, call: F) -> Self
    where
        F: Fn(&mut TestContext) -> HalStatus + Send + Sync + 'static,
    {
        Self {
            api,
            call: Arc::new(call),
            arm: None,
            disarm: None,
        }
    }

    pub fn with_arm<F>(mut self, arm: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync + 'static,
    {
        self.arm = Some(Arc::new(arm));
        self
    }

    pub fn with_disarm<F>(mut self, disarm: F) -> Self
    where
        F: Fn(&mut TestContext) + Send + Sync + 'static,
    {
        self.disarm = Some(Arc::new(disarm));
        self
    }

    /// Arm on an initialized HAL; a failure here fails the case
    fn arm_initialized(&self, ctx: &mut TestContext) -> Result<(), TestFailure> {
        match &self.arm {
            Some(arm) => arm(ctx),
            None => Ok(()),
        }
    }

    /// Arm on an uninitialized HAL, where a conforming HAL rejects the setup
    fn arm_uninitialized(&self, ctx: &mut TestContext) {
        if let Some(arm) = &self.arm {
            let _ = arm(ctx);
        }
    }

    fn disarm(&self, ctx: &mut TestContext) {
        if let Some(disarm) = &self.disarm {
            disarm(ctx);
        }
    }
}

/// Which fixture index a getter takes as its first argument
#[derive(Clone, Copy, Debug)]
pub(crate) enum IndexKind {
    Radio,
    Ssid,
}

impl IndexKind {
    fn valid(self, ctx: &TestContext) -> i32 {
        match self {
            IndexKind::Radio => ctx.radio_index(),
            IndexKind::Ssid => ctx.ssid_index(),
        }
    }
}

type GetterFn = Arc<dyn Fn(&mut TestContext, i32, bool) -> HalStatus + Send + Sync>;

/// `INT fn(INT index, T *output)`: called with an index and either a
/// buffer or `NULL`
#[derive(Clone)]
pub(crate) struct IndexedGetter {
    api: &'static str,
    index: IndexKind,
    call: GetterFn,
}

impl IndexedGetter {
    pub fn new<F>(api: &'static str, index: IndexKind, call: F) -> Self
    where
        F: Fn(&mut TestContext, i32, bool) -> HalStatus + Send + Sync + 'static,
    {
        Self {
            api,
            index,
            call: Arc::new(call),
        }
    }

    pub fn probe(&self) -> ApiProbe {
        let getter = self.clone();
        ApiProbe::new(self.api, move |ctx| {
            let index = getter.index.valid(ctx);
            (getter.call)(ctx, index, true)
        })
    }

    /// `_invalid_index` and `_null_output`
    pub fn negative_cases(&self) -> Vec<TestCase> {
        let invalid = self.clone();
        let null = self.clone();
        vec![
            invalid_index_case(self.api, move |ctx, index| (invalid.call)(ctx, index, true)),
            null_arg_case(self.api, "output", move |ctx| {
                let index = null.index.valid(ctx);
                (null.call)(ctx, index, false)
            }),
        ]
    }
}

fn all_probes() -> Vec<ApiProbe> {
    let mut probes = radio::probes();
    probes.extend(ssid::probes());
    probes.extend(client::probes());
    probes
}

/// The HAL has never been initialized
fn before_init_case(probe: &ApiProbe) -> TestCase {
    let probe = probe.clone();
    let api = probe.api;
    TestCase::negative(
        format!("{api}_before_init"),
        api,
        "rejected before wifi_init",
        move |ctx| {
            probe.arm_uninitialized(ctx);
            let status = (probe.call)(ctx);
            probe.disarm(ctx);
            expect_status(api, status, HalStatus::Err)
        },
    )
}

/// The HAL was initialized and then uninitialized
fn after_uninit_case(probe: &ApiProbe) -> TestCase {
    let probe = probe.clone();
    let api = probe.api;
    TestCase::negative(
        format!("{api}_after_uninit"),
        api,
        "rejected after wifi_uninit",
        move |ctx| {
            probe.arm_initialized(ctx)?;
            ctx.enter_uninitialized()?;
            probe.arm_uninitialized(ctx);
            let status = (probe.call)(ctx);
            ctx.restore_precondition()?;
            probe.disarm(ctx);
            expect_status(api, status, HalStatus::Err)
        },
    )
}

/// Every out-of-range index must be rejected
pub(crate) fn invalid_index_case<F>(api: &'static str, call: F) -> TestCase
where
    F: Fn(&mut TestContext, i32) -> HalStatus + Send + Sync + 'static,
{
    TestCase::negative(
        format!("{api}_invalid_index"),
        api,
        "rejects an out-of-range index",
        move |ctx| {
            for index in ctx.invalid_indices() {
                let status = call(ctx, index);
                expect(
                    status == HalStatus::Err,
                    format!("{api} returned {status} for index {index}, expected RETURN_ERR"),
                )?;
            }
            Ok(())
        },
    )
}

/// A `NULL` pointer argument must be rejected
pub(crate) fn null_arg_case<F>(api: &'static str, arg: &str, call: F) -> TestCase
where
    F: Fn(&mut TestContext) -> HalStatus + Send + Sync + 'static,
{
    TestCase::negative(
        format!("{api}_null_{arg}"),
        api,
        format!("rejects a NULL {arg}"),
        move |ctx| expect_status(api, call(ctx), HalStatus::Err),
    )
}

pub fn register_noinit_suite(registry: &mut Registry) {
    let mut suite = Suite::new(NOINIT_SUITE, Precondition::NoInit);
    suite.extend(lifecycle::noinit_cases());
    suite.extend(all_probes().iter().map(before_init_case));
    suite.add(radio::dual_band_before_init_case());
    registry.add_suite(suite);
}

pub fn register_init_suite(registry: &mut Registry) {
    let mut suite = Suite::new(INIT_SUITE, Precondition::Init);
    suite.extend(lifecycle::initialized_cases());
    suite.extend(radio::init_cases());
    suite.extend(ssid::init_cases());
    suite.extend(client::init_cases());
    suite.extend(all_probes().iter().map(after_uninit_case));
    registry.add_suite(suite);
}

pub fn register_init_with_config_suite(registry: &mut Registry) {
    let mut suite = Suite::new(INIT_WITH_CONFIG_SUITE, Precondition::InitWithConfig);
    suite.extend(lifecycle::initialized_cases());
    suite.extend(radio::init_with_config_cases());
    suite.extend(ssid::init_with_config_cases());
    suite.extend(client::init_with_config_cases());
    registry.add_suite(suite);
}

/// All three suites, in execution order
pub fn register_all() -> Registry {
    let mut registry = Registry::new();
    register_noinit_suite(&mut registry);
    register_init_suite(&mut registry);
    register_init_with_config_suite(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::executor::SuiteRunner;
    use crate::hal::{api, SimHal, SimQuirk};
    use crate::models::suite::CaseKind;
    use crate::models::{RunSummary, TestResult, TestStatus};
    use std::collections::HashSet;

    fn run(hal: SimHal) -> RunSummary {
        let ctx = TestContext::new(Box::new(hal), Fixtures::example());
        SuiteRunner::new(ctx).run_all(&register_all())
    }

    fn failures(summary: &RunSummary) -> Vec<&TestResult> {
        summary
            .results()
            .filter(|r| r.status != TestStatus::Pass)
            .collect()
    }

    fn status(summary: &RunSummary, suite: &str, case_id: &str) -> TestStatus {
        summary
            .results()
            .find(|r| r.suite == suite && r.case_id == case_id)
            .map(|r| r.status)
            .unwrap_or_else(|| panic!("no result for {suite}/{case_id}"))
    }

    #[test]
    fn test_case_ids_unique_per_suite() {
        let registry = register_all();
        assert_eq!(registry.suites().len(), 3);
        for suite in registry.suites() {
            let ids: HashSet<&str> = suite.cases.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids.len(), suite.cases.len(), "duplicate id in {}", suite.name);
        }
    }

    #[test]
    fn test_every_api_has_positive_and_negative() {
        let registry = register_all();
        let cases: Vec<&TestCase> = registry.suites().iter().flat_map(|s| &s.cases).collect();
        for api in api::all_apis() {
            for kind in [CaseKind::Positive, CaseKind::Negative] {
                assert!(
                    cases.iter().any(|c| c.api == api && c.kind == kind),
                    "{api} has no {kind} case"
                );
            }
        }
    }

    #[test]
    fn test_noinit_suite_probes_every_status_api() {
        let registry = register_all();
        let Some(noinit) = registry.suite(NOINIT_SUITE) else {
            panic!("noinit suite missing");
        };
        for probe in all_probes() {
            assert!(noinit.case(&format!("{}_before_init", probe.api)).is_some());
        }
    }

    #[test]
    fn test_conforming_hal_passes_everything() {
        let summary = run(SimHal::new());
        let failed: Vec<String> = failures(&summary).iter().map(|r| r.to_string()).collect();
        assert!(failed.is_empty(), "unexpected failures:\n{}", failed.join("\n"));
        assert_eq!(summary.hal_version.as_deref(), Some("3.0"));
        assert_eq!(summary.counts.total, register_all().total_cases());
    }

    #[test]
    fn test_run_leaves_hal_uninitialized() {
        let ctx = TestContext::new(Box::new(SimHal::new()), Fixtures::example());
        let mut runner = SuiteRunner::new(ctx);
        runner.run_all(&register_all());
        assert_eq!(runner.into_context().state(), Precondition::NoInit);
    }

    #[test]
    fn test_ignored_init_state_is_detected() {
        let summary = run(SimHal::new().with_quirk(SimQuirk::IgnoreInitState));
        let state_cases: Vec<&TestResult> = summary
            .results()
            .filter(|r| r.case_id.ends_with("_before_init") || r.case_id.ends_with("_after_uninit"))
            .filter(|r| r.case_id != "wifi_getDualBandSupport_before_init")
            .collect();

        assert_eq!(state_cases.len(), 2 * all_probes().len());
        for result in &state_cases {
            assert_eq!(result.status, TestStatus::Fail, "{}", result.qualified_id());
        }
        for case_id in ["wifi_lastConnected_Endpoint_before_init", "wifi_cancelWpsPairing_before_init"] {
            assert_eq!(status(&summary, NOINIT_SUITE, case_id), TestStatus::Fail);
        }
        for case_id in ["wifi_lastConnected_Endpoint_after_uninit", "wifi_cancelWpsPairing_after_uninit"] {
            assert_eq!(status(&summary, INIT_SUITE, case_id), TestStatus::Fail);
        }
        assert_eq!(
            status(&summary, NOINIT_SUITE, "wifi_getDualBandSupport_before_init"),
            TestStatus::Pass
        );
        assert!(failures(&summary).iter().all(|r| r.kind == CaseKind::Negative));
    }

    #[test]
    fn test_ignored_index_bounds_are_detected() {
        let summary = run(SimHal::new().with_quirk(SimQuirk::IgnoreIndexBounds));
        let failed = failures(&summary);
        assert!(!failed.is_empty());
        assert!(failed.iter().all(|r| r.case_id.ends_with("_invalid_index")));
        assert!(summary
            .results()
            .filter(|r| r.case_id.ends_with("_invalid_index"))
            .all(|r| r.status == TestStatus::Fail));
    }

    #[test]
    fn test_accepted_null_output_is_detected() {
        let summary = run(SimHal::new().with_quirk(SimQuirk::AcceptNullOutput));
        assert!(summary
            .results()
            .filter(|r| r.case_id.ends_with("_null_output"))
            .all(|r| r.status == TestStatus::Fail));
        assert_eq!(
            status(&summary, INIT_SUITE, "wifi_getRadioStandard_null_flags"),
            TestStatus::Fail
        );
        assert!(failures(&summary).iter().all(|r| r.kind == CaseKind::Negative));
    }

    #[test]
    fn test_bad_security_string_is_detected() {
        let summary = run(SimHal::new().with_quirk(SimQuirk::BadSecurityString));
        for case_id in [
            "wifi_getStats_positive",
            "wifi_getNeighboringWiFiDiagnosticResult_positive",
            "wifi_getSpecificSSIDInfo_positive",
        ] {
            assert_eq!(status(&summary, INIT_SUITE, case_id), TestStatus::Fail, "{case_id}");
        }
        let result = summary
            .results()
            .find(|r| r.case_id == "wifi_getStats_positive")
            .and_then(|r| r.message.clone())
            .unwrap_or_default();
        assert!(result.contains("WPA9-Personal"));
    }

    #[test]
    fn test_missing_fixtures_fail_only_dependent_cases() {
        let mut fixtures = Fixtures::example();
        fixtures.enterprise = Default::default();
        let ctx = TestContext::new(Box::new(SimHal::new()), fixtures);
        let summary = SuiteRunner::new(ctx).run_all(&register_all());

        let failed = failures(&summary);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].case_id, "wifi_connectEndpoint_enterprise");
        assert_eq!(
            failed[0].message.as_deref(),
            Some("fixture value missing: enterprise.ssid")
        );
    }
}
