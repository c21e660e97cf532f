//! Interactive console
//!
//! A line-oriented menu over the registry: pick a suite, then run a single
//! case or the whole suite. Input and output are generic so the loop can be
//! driven from a script.

use std::io::{self, BufRead, Write};

use crate::executor::SuiteRunner;
use crate::models::{Registry, Suite, TestResult};
use crate::output::ResultFormatter;

enum Step {
    Continue,
    Back,
    Quit,
}

pub struct Console<'a, R, W> {
    runner: &'a mut SuiteRunner,
    registry: &'a Registry,
    input: R,
    output: W,
    formatter: ResultFormatter,
    results: Vec<TestResult>,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(
        runner: &'a mut SuiteRunner,
        registry: &'a Registry,
        input: R,
        output: W,
        formatter: ResultFormatter,
    ) -> Self {
        Self {
            runner,
            registry,
            input,
            output,
            formatter,
            results: Vec::new(),
        }
    }

    /// Run until `q` or end of input; returns every result produced
    pub fn run(mut self) -> io::Result<Vec<TestResult>> {
        writeln!(self.output, "WiFi HAL L1 console ({} HAL)", self.runner.context().backend())?;
        self.list_suites()?;

        while let Some(line) = self.prompt("suite")? {
            match line.as_str() {
                "" => continue,
                "q" | "quit" => break,
                "l" | "list" => self.list_suites()?,
                "h" | "help" => self.help_suites()?,
                choice => match self.pick(choice, self.registry.suites().len()) {
                    Some(i) => {
                        let registry = self.registry;
                        if let Step::Quit = self.suite_menu(&registry.suites()[i])? {
                            break;
                        }
                        self.list_suites()?;
                    }
                    None => writeln!(self.output, "Unknown choice '{choice}', 'h' for help")?,
                },
            }
        }

        Ok(self.results)
    }

    fn suite_menu(&mut self, suite: &Suite) -> io::Result<Step> {
        self.list_cases(suite)?;

        while let Some(line) = self.prompt(&suite.name)? {
            let step = match line.as_str() {
                "" => Step::Continue,
                "q" | "quit" => Step::Quit,
                "b" | "back" => Step::Back,
                "l" | "list" => {
                    self.list_cases(suite)?;
                    Step::Continue
                }
                "h" | "help" => {
                    self.help_cases()?;
                    Step::Continue
                }
                "a" | "all" => {
                    let summary = self.runner.run_suite(suite);
                    writeln!(self.output, "{}", self.formatter.format_suite(&summary))?;
                    self.results.extend(summary.results);
                    Step::Continue
                }
                choice => {
                    match self.pick(choice, suite.cases.len()) {
                        Some(i) => {
                            let result = self.runner.run_one(suite, &suite.cases[i]);
                            writeln!(self.output, "{}", self.formatter.format_result(&result))?;
                            self.results.push(result);
                        }
                        None => writeln!(self.output, "Unknown choice '{choice}', 'h' for help")?,
                    }
                    Step::Continue
                }
            };
            match step {
                Step::Continue => {}
                other => return Ok(other),
            }
        }

        Ok(Step::Quit)
    }

    /// `None` at end of input
    fn prompt(&mut self, context: &str) -> io::Result<Option<String>> {
        write!(self.output, "{context}> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 1-based menu choice to index
    fn pick(&self, choice: &str, len: usize) -> Option<usize> {
        choice
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=len).contains(n))
            .map(|n| n - 1)
    }

    fn list_suites(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        for (i, suite) in self.registry.suites().iter().enumerate() {
            writeln!(
                self.output,
                "  {:2}. {:<32} [{}] {} cases",
                i + 1,
                suite.name,
                suite.precondition,
                suite.cases.len()
            )?;
        }
        writeln!(self.output, "Select a suite by number, 'q' to quit")
    }

    fn list_cases(&mut self, suite: &Suite) -> io::Result<()> {
        writeln!(self.output, "\n{} ({})", suite.name, suite.precondition)?;
        for (i, case) in suite.cases.iter().enumerate() {
            writeln!(
                self.output,
                "  {:3}. {:<52} {}",
                i + 1,
                case.id,
                case.kind
            )?;
        }
        writeln!(self.output, "Run a case by number, 'a' for all, 'b' to go back")
    }

    fn help_suites(&mut self) -> io::Result<()> {
        writeln!(self.output, "  <n>  select suite n")?;
        writeln!(self.output, "  l    list suites")?;
        writeln!(self.output, "  q    quit")
    }

    fn help_cases(&mut self) -> io::Result<()> {
        writeln!(self.output, "  <n>  run case n")?;
        writeln!(self.output, "  a    run the whole suite")?;
        writeln!(self.output, "  l    list cases")?;
        writeln!(self.output, "  b    back to the suite list")?;
        writeln!(self.output, "  q    quit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::executor::TestContext;
    use crate::hal::SimHal;
    use crate::models::TestStatus;
    use crate::output::OutputFormat;
    use crate::suites;

    fn drive(script: &str) -> (Vec<TestResult>, String, SuiteRunner) {
        let registry = suites::register_all();
        let mut runner =
            SuiteRunner::new(TestContext::new(Box::new(SimHal::new()), Fixtures::example()));
        let mut output = Vec::new();

        let results = Console::new(
            &mut runner,
            &registry,
            script.as_bytes(),
            &mut output,
            ResultFormatter::new(OutputFormat::Summary),
        )
        .run()
        .unwrap();

        (results, String::from_utf8(output).unwrap(), runner)
    }

    #[test]
    fn test_run_single_case() {
        let (results, output, runner) = drive("2\n1\nq\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].suite, suites::INIT_SUITE);
        assert_eq!(results[0].status, TestStatus::Pass);
        assert!(output.contains(suites::INIT_SUITE));
        assert!(!runner.into_context().state().initialized());
    }

    #[test]
    fn test_run_whole_suite_then_back() {
        let registry = suites::register_all();
        let expected = registry.suites()[0].cases.len();

        let (results, output, _) = drive("1\na\nb\nl\nq\n");
        assert_eq!(results.len(), expected);
        assert!(results.iter().all(|r| r.status == TestStatus::Pass));
        assert!(output.contains("passed"));
    }

    #[test]
    fn test_unknown_choice_and_eof() {
        let (results, output, _) = drive("9\nx\n1\n999\n");
        assert!(results.is_empty());
        assert!(output.contains("Unknown choice '9'"));
        assert!(output.contains("Unknown choice '999'"));
    }
}
