//! Output formatters for test results
//!
//! Provides table, JSON, CSV and summary output formats.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::models::{RunSummary, SuiteSummary, TestResult, TestStatus};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

const CSV_HEADER: [&str; 7] = [
    "suite",
    "case_id",
    "api",
    "kind",
    "status",
    "duration_ms",
    "message",
];

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json => to_json(result, false),
            OutputFormat::JsonPretty => to_json(result, true),
            OutputFormat::Csv => to_csv(std::iter::once(result), false),
            OutputFormat::Summary => format!(
                "{} {} ({}ms)",
                result.status.symbol(),
                result.case_id,
                result.duration_ms
            ),
        }
    }

    fn status_label(&self, status: TestStatus) -> String {
        let label = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return label;
        }
        let color = match status {
            TestStatus::Pass => "32",
            TestStatus::Fail | TestStatus::Error => "31",
            TestStatus::Skip => "33",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let mut line = format!(
            "{:<9} {:<52} [{:>6}ms]",
            self.status_label(result.status),
            result.case_id,
            result.duration_ms
        );
        if !result.status.is_success() {
            if let Some(message) = &result.message {
                line.push_str(&format!("\n          {message}"));
            }
            if let Some(location) = &result.location {
                line.push_str(&format!(" ({location})"));
            }
        }
        line
    }

    /// Format one suite's results
    pub fn format_suite(&self, summary: &SuiteSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_suite_table(summary),
            OutputFormat::Json => to_json(summary, false),
            OutputFormat::JsonPretty => to_json(summary, true),
            OutputFormat::Csv => to_csv(&summary.results, true),
            OutputFormat::Summary => self.format_suite_brief(summary),
        }
    }

    fn format_suite_table(&self, summary: &SuiteSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  {:<40} {:>19} ║\n",
            summary.suite,
            summary.precondition.name()
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        for result in &summary.results {
            output.push_str("  ");
            output.push_str(&self.format_result_table(result));
            output.push('\n');
        }

        output.push_str("  ──────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  {}\n", self.counts_line(summary)));
        output
    }

    fn counts_line(&self, summary: &SuiteSummary) -> String {
        let counts = &summary.counts;
        let passed = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", counts.passed)
        } else {
            counts.passed.to_string()
        };
        let failed = if self.colorize && counts.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", counts.failed)
        } else {
            counts.failed.to_string()
        };

        format!(
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {} | {:.1}% in {}ms",
            counts.total,
            passed,
            failed,
            counts.skipped,
            counts.errors,
            summary.pass_rate(),
            summary.total_duration_ms
        )
    }

    fn format_suite_brief(&self, summary: &SuiteSummary) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%) in {}ms",
            summary.suite,
            summary.counts.passed,
            summary.counts.total,
            summary.pass_rate(),
            summary.total_duration_ms
        )
    }

    /// Format a whole run
    pub fn format_run(&self, run: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_run_table(run),
            OutputFormat::Json => to_json(run, false),
            OutputFormat::JsonPretty => to_json(run, true),
            OutputFormat::Csv => to_csv(run.results(), true),
            OutputFormat::Summary => {
                let mut output: Vec<String> = run
                    .suites
                    .iter()
                    .map(|s| self.format_suite_brief(s))
                    .collect();
                output.push(self.run_totals(run));
                output.join("\n")
            }
        }
    }

    fn format_run_table(&self, run: &RunSummary) -> String {
        let mut output = String::new();
        for suite in &run.suites {
            output.push_str(&self.format_suite_table(suite));
        }

        let failures: Vec<&TestResult> = run
            .results()
            .filter(|r| matches!(r.status, TestStatus::Fail | TestStatus::Error))
            .collect();
        if !failures.is_empty() {
            output.push_str("\n Failed cases:\n");
            for result in failures {
                output.push_str(&format!(
                    "   - {} {}: {}\n",
                    self.status_label(result.status),
                    result.qualified_id(),
                    result.message.as_deref().unwrap_or("")
                ));
            }
        }

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(" {}\n", self.run_totals(run)));
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }

    fn run_totals(&self, run: &RunSummary) -> String {
        let rate = format!("{:.1}%", run.pass_rate());
        let rate = if self.colorize {
            let color = if run.has_failures() { "31" } else { "32" };
            format!("\x1b[{color}m{rate}\x1b[0m")
        } else {
            rate
        };
        format!(
            "{} HAL {} - {}/{} passed ({}), {} failed, {} errors, {} skipped in {}ms",
            run.backend,
            run.hal_version.as_deref().unwrap_or("unknown"),
            run.counts.passed,
            run.counts.total,
            rate,
            run.counts.failed,
            run.counts.errors,
            run.counts.skipped,
            run.total_duration_ms
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.unwrap_or_default()
}

fn to_csv<'a>(results: impl IntoIterator<Item = &'a TestResult>, header: bool) -> String {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let mut rows = Vec::new();
    if header {
        rows.push(CSV_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    }
    for result in results {
        rows.push(vec![
            result.suite.clone(),
            result.case_id.clone(),
            result.api.clone(),
            result.kind.to_string(),
            result.status.to_string(),
            result.duration_ms.to_string(),
            result.message.clone().unwrap_or_default(),
        ]);
    }
    for row in rows {
        if writer.write_record(&row).is_err() {
            break;
        }
    }

    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

/// Write a run to a file, without color
pub fn write_run_to_file(path: &Path, run: &RunSummary, format: OutputFormat) -> Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let mut content = formatter.format_run(run);
    content.push('\n');

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Precondition, TestCase};

    fn sample_run() -> RunSummary {
        let suite = "L1 wifi-hal init";
        let ok = TestCase::positive("wifi_getRadioChannel_positive", "wifi_getRadioChannel", "", |_| Ok(()));
        let bad = TestCase::negative("wifi_getRadioChannel_null_output", "wifi_getRadioChannel", "", |_| Ok(()));
        let results = vec![
            TestResult::pass(suite, &ok, 2),
            TestResult::fail(suite, &bad, 1, "wifi_getRadioChannel: expected RETURN_ERR, got RETURN_OK, \"quoted\"")
                .with_location("src/suites/radio.rs:42"),
        ];
        RunSummary::new("sim", vec![SuiteSummary::new(suite, Precondition::Init, results)])
            .with_hal_version("3.0")
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_table_without_color() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_run(&sample_run());
        assert!(!output.contains("\x1b["));
        assert!(output.contains("wifi_getRadioChannel_positive"));
        assert!(output.contains("radio.rs:42"));
        assert!(output.contains("1/2 passed"));
    }

    #[test]
    fn test_table_colorized() {
        let output = ResultFormatter::new(OutputFormat::Table).format_run(&sample_run());
        assert!(output.contains("\x1b[31m"));
    }

    #[test]
    fn test_json_round_trips_counts() {
        let output = ResultFormatter::new(OutputFormat::Json).format_run(&sample_run());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["passed"], 1);
        assert_eq!(value["hal_version"], "3.0");
        assert_eq!(value["suites"][0]["results"][1]["status"], "fail");
    }

    #[test]
    fn test_csv_quotes_messages() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_run(&sample_run());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("suite,case_id,api"));
        assert!(lines[2].contains("\"\"quoted\"\""));
    }

    #[test]
    fn test_summary_format() {
        let run = sample_run();
        let formatter = ResultFormatter::new(OutputFormat::Summary).no_color();
        let output = formatter.format_run(&run);
        assert!(output.starts_with("L1 wifi-hal init: 1/2 passed"));
        let line = formatter.format_result(&run.suites[0].results[0]);
        assert_eq!(line, "✓ wifi_getRadioChannel_positive (2ms)");
    }

    #[test]
    fn test_write_run_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        write_run_to_file(&path, &sample_run(), OutputFormat::Table).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("\x1b["));
    }
}
