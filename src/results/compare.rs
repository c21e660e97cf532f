//! Run comparison
//!
//! Compare two stored runs case by case.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{TestResult, TestStatus};
use crate::results::storage::StoredRun;

/// A case whose status differs between two runs
#[derive(Clone, Debug, Serialize)]
pub struct CaseChange {
    /// `suite/case`
    pub case: String,
    pub api: String,
    pub before: TestStatus,
    pub after: TestStatus,
    /// Message of the newer result
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunComparison {
    pub baseline_id: String,
    pub current_id: String,
    /// Pass in the baseline, anything else now
    pub regressions: Vec<CaseChange>,
    /// Not passing in the baseline, pass now
    pub fixes: Vec<CaseChange>,
    /// Status changed between two non-pass values
    pub changed: Vec<CaseChange>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
    pub baseline_pass_rate: f64,
    pub current_pass_rate: f64,
}

impl RunComparison {
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }

    pub fn pass_rate_delta(&self) -> f64 {
        self.current_pass_rate - self.baseline_pass_rate
    }
}

/// Run comparator
pub struct RunComparator;

impl RunComparator {
    /// Compare `current` against `baseline`
    pub fn compare(baseline: &StoredRun, current: &StoredRun) -> RunComparison {
        let before = index(baseline);
        let after = index(current);

        let mut comparison = RunComparison {
            baseline_id: baseline.id.clone(),
            current_id: current.id.clone(),
            regressions: Vec::new(),
            fixes: Vec::new(),
            changed: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
            unchanged: 0,
            baseline_pass_rate: baseline.summary.pass_rate(),
            current_pass_rate: current.summary.pass_rate(),
        };

        for (case, new) in &after {
            let Some(old) = before.get(case) else {
                comparison.added.push(case.clone());
                continue;
            };
            if old.status == new.status {
                comparison.unchanged += 1;
                continue;
            }

            let change = CaseChange {
                case: case.clone(),
                api: new.api.clone(),
                before: old.status,
                after: new.status,
                message: new.message.clone(),
            };
            match (old.status.is_success(), new.status.is_success()) {
                (true, false) => comparison.regressions.push(change),
                (false, true) => comparison.fixes.push(change),
                _ => comparison.changed.push(change),
            }
        }

        comparison.removed = before
            .keys()
            .filter(|case| !after.contains_key(*case))
            .cloned()
            .collect();

        comparison
    }
}

fn index(run: &StoredRun) -> BTreeMap<String, &TestResult> {
    run.summary
        .results()
        .map(|r| (r.qualified_id(), r))
        .collect()
}

/// Comparison report formatter
pub struct ComparisonFormatter;

impl ComparisonFormatter {
    /// Format comparison as text
    pub fn format_table(comparison: &RunComparison) -> String {
        let mut output = String::new();

        output.push_str("\n╔════════════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║ {} -> {}\n",
            comparison.baseline_id, comparison.current_id
        ));
        output.push_str("╠════════════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!(
            "║ Pass rate: {:.1}% -> {:.1}% ({:+.1})\n",
            comparison.baseline_pass_rate,
            comparison.current_pass_rate,
            comparison.pass_rate_delta()
        ));
        output.push_str(&format!(
            "║ Regressions: {} | Fixes: {} | Changed: {} | Added: {} | Removed: {} | Unchanged: {}\n",
            comparison.regressions.len(),
            comparison.fixes.len(),
            comparison.changed.len(),
            comparison.added.len(),
            comparison.removed.len(),
            comparison.unchanged
        ));
        output.push_str("╚════════════════════════════════════════════════════════════════════╝\n");

        let sections = [
            ("Regressions", &comparison.regressions),
            ("Fixes", &comparison.fixes),
            ("Changed", &comparison.changed),
        ];
        for (title, changes) in sections {
            if changes.is_empty() {
                continue;
            }
            output.push_str(&format!("\n {title}:\n"));
            for change in changes {
                output.push_str(&format!(
                    "   {} {} -> {}",
                    change.case, change.before, change.after
                ));
                if let Some(message) = &change.message {
                    output.push_str(&format!(" ({message})"));
                }
                output.push('\n');
            }
        }

        for (title, cases) in [("Added", &comparison.added), ("Removed", &comparison.removed)] {
            if !cases.is_empty() {
                output.push_str(&format!("\n {title}:\n"));
                for case in cases {
                    output.push_str(&format!("   {case}\n"));
                }
            }
        }

        output
    }

    /// Format comparison as JSON
    pub fn format_json(comparison: &RunComparison) -> String {
        serde_json::to_string_pretty(comparison).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::storage::tests::stored_run;

    #[test]
    fn test_compare_runs() {
        let baseline = stored_run(
            "vendor",
            &[("stays", true), ("breaks", true), ("heals", false), ("gone", true)],
        );
        let current = stored_run(
            "vendor",
            &[("stays", true), ("breaks", false), ("heals", true), ("new", false)],
        );

        let comparison = RunComparator::compare(&baseline, &current);
        assert_eq!(comparison.unchanged, 1);
        assert_eq!(comparison.regressions.len(), 1);
        assert_eq!(comparison.regressions[0].case, "L1 wifi-hal init/breaks");
        assert_eq!(comparison.regressions[0].after, TestStatus::Fail);
        assert_eq!(comparison.fixes.len(), 1);
        assert_eq!(comparison.added, vec!["L1 wifi-hal init/new"]);
        assert_eq!(comparison.removed, vec!["L1 wifi-hal init/gone"]);
        assert!(comparison.has_regressions());
    }

    #[test]
    fn test_identical_runs() {
        let run = stored_run("sim", &[("a", true), ("b", false)]);
        let comparison = RunComparator::compare(&run, &run);
        assert!(!comparison.has_regressions());
        assert!(comparison.fixes.is_empty());
        assert_eq!(comparison.unchanged, 2);
        assert_eq!(comparison.pass_rate_delta(), 0.0);
    }

    #[test]
    fn test_format_table() {
        let baseline = stored_run("sim", &[("a", true)]);
        let current = stored_run("sim", &[("a", false)]);
        let text = ComparisonFormatter::format_table(&RunComparator::compare(&baseline, &current));
        assert!(text.contains("Regressions: 1"));
        assert!(text.contains("L1 wifi-hal init/a PASS -> FAIL (expected RETURN_OK)"));

        let json = ComparisonFormatter::format_json(&RunComparator::compare(&baseline, &current));
        assert!(json.contains("\"regressions\""));
    }
}
