//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};

mod console;

pub use console::Console;

/// Level-1 conformance tests for the WiFi client/common HAL
#[derive(Parser, Debug)]
#[command(name = "wifi-hal-l1")]
#[command(version)]
#[command(about = "Run Level-1 conformance tests against a WiFi HAL implementation")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run suites in batch mode
    Run(RunArgs),

    /// Interactive mode: pick suites and cases to run
    Console(ConsoleArgs),

    /// List suites and cases
    List(ListArgs),

    /// View stored results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Which HAL to run against and with what inputs
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct HalArgs {
    /// HAL backend (vendor, sim)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Vendor HAL shared library
    #[arg(short, long)]
    pub library: Option<String>,

    /// Fixture file with interface name, credentials and scan parameters
    #[arg(long)]
    pub fixtures: Option<String>,

    /// Sim deviation to enable (repeatable, sim backend only)
    #[arg(long = "quirk")]
    pub quirks: Vec<String>,

    /// Connect callback timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for run command
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub hal: HalArgs,

    /// Run only this suite (repeatable)
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// Run only this case id or `suite/case` pattern (repeatable)
    #[arg(short, long = "test")]
    pub tests: Vec<String>,

    /// Case ids to report as skipped (comma-separated)
    #[arg(long)]
    pub skip: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Also write the results to this file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Do not store the run in the results directory
    #[arg(long)]
    pub no_store: bool,
}

/// Arguments for console command
#[derive(ClapArgs, Debug)]
pub struct ConsoleArgs {
    #[command(flatten)]
    pub hal: HalArgs,
}

/// Arguments for list command
#[derive(ClapArgs, Debug)]
pub struct ListArgs {
    /// Show API name and kind of every case
    #[arg(short, long)]
    pub detailed: bool,

    /// List only this suite
    #[arg(short, long)]
    pub suite: Option<String>,
}

/// Arguments for results command
#[derive(ClapArgs, Debug)]
pub struct ResultsArgs {
    /// Run ID to show (latest when omitted with --backend)
    pub id: Option<String>,

    /// Filter by backend
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Compare the shown run against this baseline run ID
    #[arg(long)]
    pub compare: Option<String>,

    /// Export the shown run (.json, .csv, .md or .txt)
    #[arg(short, long)]
    pub export: Option<String>,

    /// Output format (table, json, text, markdown)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Delete the given run
    #[arg(long)]
    pub delete: bool,
}

/// Arguments for config command
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        #[arg(short, long, default_value = "./wifi-hal-l1.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        file: Option<String>,
    },

    /// Print one setting
    Get {
        key: String,

        #[arg(short, long)]
        file: Option<String>,
    },

    /// Change one setting and save the file
    Set {
        key: String,
        value: String,

        #[arg(short, long)]
        file: Option<String>,
    },

    /// Describe the environment variables
    Env,

    /// Write an example fixture file
    Fixtures {
        #[arg(short, long, default_value = "./fixtures.yaml")]
        output: String,

        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args() {
        let args = Args::parse_from(["wifi-hal-l1", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
                assert!(list_args.suite.is_none());
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "wifi-hal-l1",
            "run",
            "--backend",
            "sim",
            "--quirk",
            "ignore-init-state",
            "--quirk",
            "accept-null-output",
            "--test",
            "wifi_getRadioChannel_positive",
            "--skip",
            "a,b",
            "--no-store",
            "-vv",
        ]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.hal.backend.as_deref(), Some("sim"));
                assert_eq!(run.hal.quirks.len(), 2);
                assert_eq!(run.tests, vec!["wifi_getRadioChannel_positive"]);
                assert_eq!(run.skip.as_deref(), Some("a,b"));
                assert!(run.no_store);
                assert!(run.format.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_config_set() {
        let args = Args::parse_from([
            "wifi-hal-l1",
            "--config",
            "custom.yaml",
            "config",
            "set",
            "backend",
            "sim",
        ]);
        assert_eq!(args.config.as_deref(), Some("custom.yaml"));
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Set { key, value, file },
            }) => {
                assert_eq!(key, "backend");
                assert_eq!(value, "sim");
                assert!(file.is_none());
            }
            _ => panic!("Expected config set"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
