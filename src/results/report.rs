//! Report generation for stored runs

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};

use crate::models::{SuiteSummary, TestStatus};
use crate::results::compare::RunComparison;
use crate::results::storage::StoredRun;

/// Report output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Report generator
pub struct ReportGenerator {
    format: ReportFormat,
}

impl ReportGenerator {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Render one stored run
    pub fn run_report(&self, run: &StoredRun) -> String {
        let rendered = match self.format {
            ReportFormat::Text => text_report(run),
            ReportFormat::Markdown => markdown_report(run),
        };
        rendered.unwrap_or_default()
    }

    /// Render a comparison of two stored runs
    pub fn comparison_report(&self, comparison: &RunComparison) -> String {
        let rendered = match self.format {
            ReportFormat::Text => Ok(super::ComparisonFormatter::format_table(comparison)),
            ReportFormat::Markdown => markdown_comparison(comparison),
        };
        rendered.unwrap_or_default()
    }
}

fn text_report(run: &StoredRun) -> Result<String, fmt::Error> {
    let mut output = String::new();
    let summary = &run.summary;

    writeln!(output, "\n{:=^70}", " WiFi HAL L1 Test Report ")?;
    writeln!(output)?;
    writeln!(output, "Run ID: {}", run.id)?;
    writeln!(output, "Backend: {}", run.backend)?;
    if let Some(library) = &run.library {
        writeln!(output, "Library: {library}")?;
    }
    writeln!(
        output,
        "HAL Version: {}",
        summary.hal_version.as_deref().unwrap_or("unknown")
    )?;
    writeln!(output, "Started: {}", format_datetime(&run.started_at))?;
    writeln!(output, "Completed: {}", format_datetime(&run.completed_at))?;
    writeln!(output)?;

    writeln!(output, "{:-^70}", " Suites ")?;
    writeln!(
        output,
        "{:<32} {:>6} {:>6} {:>6} {:>6} {:>8}",
        "Suite", "Pass", "Fail", "Skip", "Error", "Rate"
    )?;
    writeln!(output, "{:-<70}", "")?;
    for suite in &summary.suites {
        writeln!(
            output,
            "{:<32} {:>6} {:>6} {:>6} {:>6} {:>7.1}%",
            truncate(&suite.suite, 32),
            suite.counts.passed,
            suite.counts.failed,
            suite.counts.skipped,
            suite.counts.errors,
            suite.pass_rate()
        )?;
    }
    writeln!(output, "{:-<70}", "")?;
    writeln!(
        output,
        "{:<32} {:>6} {:>6} {:>6} {:>6} {:>7.1}%",
        "Total",
        summary.counts.passed,
        summary.counts.failed,
        summary.counts.skipped,
        summary.counts.errors,
        summary.pass_rate()
    )?;

    let failures: Vec<_> = summary
        .results()
        .filter(|r| matches!(r.status, TestStatus::Fail | TestStatus::Error))
        .collect();
    if !failures.is_empty() {
        writeln!(output, "\n{:-^70}", " Failures ")?;
        for result in failures {
            writeln!(
                output,
                "{} {}",
                result.status,
                result.qualified_id()
            )?;
            if let Some(message) = &result.message {
                writeln!(output, "    {message}")?;
            }
            if let Some(location) = &result.location {
                writeln!(output, "    at {location}")?;
            }
        }
    }

    writeln!(output, "\n{:=^70}", "")?;
    Ok(output)
}

fn markdown_report(run: &StoredRun) -> Result<String, fmt::Error> {
    let mut output = String::new();
    let summary = &run.summary;

    writeln!(output, "# WiFi HAL L1 Test Report\n")?;
    writeln!(output, "## Summary\n")?;
    writeln!(output, "| Property | Value |")?;
    writeln!(output, "|----------|-------|")?;
    writeln!(output, "| Run ID | `{}` |", run.id)?;
    writeln!(output, "| Backend | {} |", run.backend)?;
    if let Some(library) = &run.library {
        writeln!(output, "| Library | `{library}` |")?;
    }
    writeln!(
        output,
        "| HAL Version | {} |",
        summary.hal_version.as_deref().unwrap_or("unknown")
    )?;
    writeln!(output, "| Started | {} |", format_datetime(&run.started_at))?;
    writeln!(output, "| Completed | {} |", format_datetime(&run.completed_at))?;
    writeln!(
        output,
        "| Passed | {}/{} ({:.1}%) |",
        summary.counts.passed,
        summary.counts.total,
        summary.pass_rate()
    )?;
    writeln!(output, "| Duration | {}ms |", summary.total_duration_ms)?;
    writeln!(
        output,
        "| Host | {} / {} (v{}) |",
        run.environment.os, run.environment.arch, run.environment.tool_version
    )?;

    for suite in &summary.suites {
        markdown_suite(&mut output, suite)?;
    }
    Ok(output)
}

fn markdown_suite(output: &mut String, suite: &SuiteSummary) -> fmt::Result {
    writeln!(output, "\n## {} ({})\n", suite.suite, suite.precondition)?;
    writeln!(
        output,
        "- **Passed:** {}/{} ({:.1}%)",
        suite.counts.passed,
        suite.counts.total,
        suite.pass_rate()
    )?;
    writeln!(output, "- **Duration:** {}ms\n", suite.total_duration_ms)?;
    writeln!(output, "| Case | API | Kind | Status | Message |")?;
    writeln!(output, "|------|-----|------|--------|---------|")?;
    for result in &suite.results {
        writeln!(
            output,
            "| `{}` | `{}` | {} | {} {} | {} |",
            result.case_id,
            result.api,
            result.kind,
            result.status.symbol(),
            result.status,
            result.message.as_deref().unwrap_or("").replace('|', "\\|")
        )?;
    }
    Ok(())
}

fn markdown_comparison(comparison: &RunComparison) -> Result<String, fmt::Error> {
    let mut output = String::new();

    writeln!(output, "# Run Comparison\n")?;
    writeln!(
        output,
        "`{}` -> `{}`: pass rate {:.1}% -> {:.1}% ({:+.1})\n",
        comparison.baseline_id,
        comparison.current_id,
        comparison.baseline_pass_rate,
        comparison.current_pass_rate,
        comparison.pass_rate_delta()
    )?;

    let sections = [
        ("Regressions", &comparison.regressions),
        ("Fixes", &comparison.fixes),
        ("Changed", &comparison.changed),
    ];
    for (title, changes) in sections {
        writeln!(output, "## {} ({})\n", title, changes.len())?;
        for change in changes {
            writeln!(
                output,
                "- `{}`: {} -> {}",
                change.case, change.before, change.after
            )?;
        }
        writeln!(output)?;
    }

    if !comparison.added.is_empty() {
        writeln!(output, "## Added\n")?;
        for case in &comparison.added {
            writeln!(output, "- `{case}`")?;
        }
        writeln!(output)?;
    }
    if !comparison.removed.is_empty() {
        writeln!(output, "## Removed\n")?;
        for case in &comparison.removed {
            writeln!(output, "- `{case}`")?;
        }
    }
    Ok(output)
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::storage::tests::stored_run;
    use crate::results::RunComparator;

    #[test]
    fn test_report_format_from_str() {
        assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_str("html"), None);
    }

    #[test]
    fn test_text_report() {
        let run = stored_run("sim", &[("a", true), ("b", false)]);
        let report = ReportGenerator::new(ReportFormat::Text).run_report(&run);
        assert!(report.contains(&run.id));
        assert!(report.contains("Failures"));
        assert!(report.contains("FAIL L1 wifi-hal init/b"));
    }

    #[test]
    fn test_markdown_report() {
        let run = stored_run("sim", &[("a", true)]).with_library("/usr/lib/libwifihal.so");
        let report = ReportGenerator::new(ReportFormat::Markdown).run_report(&run);
        assert!(report.starts_with("# WiFi HAL L1 Test Report"));
        assert!(report.contains("| Library | `/usr/lib/libwifihal.so` |"));
        assert!(report.contains("## L1 wifi-hal init (wifi_init)"));
        assert!(report.contains("| `a` | `wifi_getRadioChannel` | positive | ✓ PASS |  |"));
    }

    #[test]
    fn test_markdown_comparison() {
        let baseline = stored_run("sim", &[("a", true)]);
        let current = stored_run("sim", &[("a", false), ("b", true)]);
        let comparison = RunComparator::compare(&baseline, &current);
        let report = ReportGenerator::new(ReportFormat::Markdown).comparison_report(&comparison);
        assert!(report.contains("## Regressions (1)"));
        assert!(report.contains("- `L1 wifi-hal init/b`"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("L1 wifi-hal initWithConfig", 10), "L1 wifi...");
    }
}
