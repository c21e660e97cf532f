//! Suite and test-case descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::executor::{TestContext, TestFailure};

/// HAL state a suite's setup establishes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    NoInit,
    Init,
    InitWithConfig,
}

impl Precondition {
    pub fn name(&self) -> &'static str {
        match self {
            Precondition::NoInit => "no-init",
            Precondition::Init => "wifi_init",
            Precondition::InitWithConfig => "wifi_initWithConfig",
        }
    }

    /// Whether the HAL is initialized while the suite's cases run
    pub fn initialized(&self) -> bool {
        !matches!(self, Precondition::NoInit)
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Positive,
    Negative,
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseKind::Positive => write!(f, "positive"),
            CaseKind::Negative => write!(f, "negative"),
        }
    }
}

pub type TestFn = Arc<dyn Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync>;

/// A single L1 case: one HAL entry point, one input class
#[derive(Clone)]
pub struct TestCase {
    pub id: String,
    pub api: &'static str,
    pub kind: CaseKind,
    pub description: String,
    pub func: TestFn,
}

impl TestCase {
    pub fn new<F>(
        id: impl Into<String>,
        api: &'static str,
        kind: CaseKind,
        description: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            api,
            kind,
            description: description.into(),
            func: Arc::new(func),
        }
    }

    pub fn positive<F>(id: impl Into<String>, api: &'static str, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync + 'static,
    {
        Self::new(id, api, CaseKind::Positive, description, func)
    }

    pub fn negative<F>(id: impl Into<String>, api: &'static str, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<(), TestFailure> + Send + Sync + 'static,
    {
        Self::new(id, api, CaseKind::Negative, description, func)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("api", &self.api)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered cases sharing one precondition
#[derive(Clone, Debug)]
pub struct Suite {
    pub name: String,
    pub precondition: Precondition,
    pub cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>, precondition: Precondition) -> Self {
        Self {
            name: name.into(),
            precondition,
            cases: Vec::new(),
        }
    }

    pub fn add(&mut self, case: TestCase) -> &mut Self {
        self.cases.push(case);
        self
    }

    pub fn extend(&mut self, cases: impl IntoIterator<Item = TestCase>) -> &mut Self {
        self.cases.extend(cases);
        self
    }

    pub fn case(&self, id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }
}

/// All registered suites, in registration order
#[derive(Clone, Debug, Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_suite(&mut self, suite: Suite) {
        self.suites.push(suite);
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites
            .iter()
            .find(|s| s.name == name || s.name.eq_ignore_ascii_case(name))
    }

    pub fn total_cases(&self) -> usize {
        self.suites.iter().map(|s| s.cases.len()).sum()
    }

    /// Cases matching `pattern` (see [`case_matches`])
    pub fn find_cases(&self, pattern: &str) -> Vec<(&Suite, &TestCase)> {
        self.suites
            .iter()
            .flat_map(|s| s.cases.iter().map(move |c| (s, c)))
            .filter(|(s, c)| case_matches(&s.name, &c.id, pattern))
            .collect()
    }
}

/// `pattern` is a case id, `suite/case`, or either with a trailing `*` for
/// a prefix match. Suite names compare case-insensitively.
pub fn case_matches(suite: &str, case_id: &str, pattern: &str) -> bool {
    match pattern.split_once('/') {
        Some((suite_pattern, case_pattern)) => {
            matches_pattern(&suite.to_lowercase(), &suite_pattern.to_lowercase())
                && matches_pattern(case_id, case_pattern)
        }
        None => matches_pattern(case_id, pattern),
    }
}

fn matches_pattern(value: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut noinit = Suite::new("L1 wifi-hal noinit", Precondition::NoInit);
        noinit.add(TestCase::negative(
            "wifi_uninit_without_init",
            "wifi_uninit",
            "uninit before init",
            |_| Ok(()),
        ));
        let mut init = Suite::new("L1 wifi-hal init", Precondition::Init);
        init.add(TestCase::positive(
            "wifi_getRadioChannel_positive",
            "wifi_getRadioChannel",
            "reads the channel",
            |_| Ok(()),
        ))
        .add(TestCase::negative(
            "wifi_getRadioChannel_null_output",
            "wifi_getRadioChannel",
            "NULL output",
            |_| Ok(()),
        ));

        let mut registry = Registry::new();
        registry.add_suite(noinit);
        registry.add_suite(init);
        registry
    }

    #[test]
    fn test_precondition_initialized() {
        assert!(!Precondition::NoInit.initialized());
        assert!(Precondition::Init.initialized());
        assert!(Precondition::InitWithConfig.initialized());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.total_cases(), 3);
        assert!(registry.suite("l1 wifi-hal init").is_some());
        assert!(registry.suite("missing").is_none());
    }

    #[test]
    fn test_find_cases() {
        let registry = registry();
        assert_eq!(registry.find_cases("wifi_getRadioChannel_positive").len(), 1);
        assert_eq!(registry.find_cases("wifi_getRadioChannel_*").len(), 2);
        assert_eq!(registry.find_cases("L1 wifi-hal noinit/*").len(), 1);
        assert!(registry.find_cases("L1 wifi-hal noinit/wifi_getRadioChannel_positive").is_empty());
    }

    #[test]
    fn test_case_matches() {
        assert!(case_matches("L1 wifi-hal init", "wifi_init_twice", "wifi_init_*"));
        assert!(case_matches("L1 wifi-hal init", "wifi_init_twice", "l1 wifi-hal init/*"));
        assert!(!case_matches("L1 wifi-hal init", "wifi_init_twice", "L1 wifi-hal noinit/*"));
        assert!(!case_matches("L1 wifi-hal init", "wifi_init_twice", "wifi_init"));
    }
}
