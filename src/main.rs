//! WiFi HAL L1 - Level-1 conformance tests for the WiFi client/common HAL
//!
//! Loads a vendor HAL shared library (or the built-in simulated HAL) and
//! exercises every entry point in isolation, positive and negative paths,
//! under the three init preconditions: no init, `wifi_init` and
//! `wifi_initWithConfig`.
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite against a vendor library
//! wifi-hal-l1 run --library /usr/lib/libwifihal.so --fixtures fixtures.yaml
//!
//! # Dry run against the simulated HAL with a deliberate deviation
//! wifi-hal-l1 run --backend sim --quirk accept-null-output
//!
//! # One suite, one case
//! wifi-hal-l1 run --suite "L1 wifi-hal init" --test wifi_getRadioChannel_positive
//!
//! # Interactive mode
//! wifi-hal-l1 console --backend sim
//!
//! # Stored runs
//! wifi-hal-l1 results
//! wifi-hal-l1 results <run-id> --compare <baseline-id>
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

mod cli;
mod config;
mod executor;
mod hal;
mod models;
mod output;
mod results;
mod suites;
mod utils;

use cli::{Args, Command, HalArgs};
use config::{AppConfig, ConfigFile, EnvConfig, Fixtures};
use executor::{SuiteRunner, TestContext};
use hal::{Backend, SimHal, SimQuirk, VendorHal, WifiHal};
use output::{OutputFormat, ResultFormatter};
use results::{
    ComparisonFormatter, ExportFormat, ReportFormat, ReportGenerator, ResultsStorage,
    RunComparator, StoredRun,
};
use utils::{init_logger, LogLevel};

const DEFAULT_CONFIG_PATH: &str = "./wifi-hal-l1.yaml";

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Command::Config(config_args) => {
            init_logger(LogLevel::from_verbosity(args.verbose, LogLevel::Info));
            manage_config(config_args, args.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let config = load_config(args.config.as_deref())?;
            let level = LogLevel::from_verbosity(
                args.verbose,
                LogLevel::from_str(&config.app.log_level).unwrap_or_default(),
            );
            init_logger(level);

            match command {
                Command::Run(run_args) => run_suites(run_args, &config),
                Command::Console(console_args) => run_console(console_args, &config),
                Command::List(list_args) => {
                    list_cases(list_args)?;
                    Ok(ExitCode::SUCCESS)
                }
                Command::Results(results_args) => {
                    show_results(results_args, &config.app)?;
                    Ok(ExitCode::SUCCESS)
                }
                Command::Config(_) => Ok(ExitCode::SUCCESS),
            }
        }
    }
}

/// Config file (explicit, `WIFI_HAL_L1_CONFIG`, or a standard location)
/// with environment overrides applied
fn load_config(explicit: Option<&str>) -> Result<ConfigFile> {
    let env = EnvConfig::load();
    let path = explicit.map(String::from).or_else(|| env.config_file.clone());

    let mut config = match path {
        Some(path) => ConfigFile::load(config::expand_path(&path))?,
        None => ConfigFile::load_default()?,
    };
    config.app.apply_env(&env);
    Ok(config)
}

/// Build the HAL and the context cases run in; also returns the vendor
/// library path when one was loaded
fn build_context(args: &HalArgs, config: &ConfigFile) -> Result<(TestContext, Option<String>)> {
    let app = &config.app;
    let backend_name = args.backend.as_deref().unwrap_or(&app.backend);
    let backend = Backend::from_str(backend_name)
        .ok_or_else(|| anyhow!("Unknown backend: {backend_name}. Valid: vendor, sim"))?;

    let mut quirks = config.quirks();
    for name in &args.quirks {
        let quirk = SimQuirk::from_str(name).ok_or_else(|| {
            let valid: Vec<&str> = SimQuirk::all().into_iter().map(SimQuirk::name).collect();
            anyhow!("Unknown quirk: {name}. Valid: {}", valid.join(", "))
        })?;
        if !quirks.contains(&quirk) {
            quirks.push(quirk);
        }
    }

    let (hal, library) = match backend {
        Backend::Vendor => {
            if !quirks.is_empty() {
                warn!("Quirks only apply to the sim backend, ignoring them");
            }
            let library = args
                .library
                .clone()
                .or_else(|| app.library.clone())
                .ok_or_else(|| {
                    anyhow!("No vendor HAL library given. Use --library or set `library` in the config file")
                })?;
            let path = config::expand_path(&library);
            let vendor = VendorHal::load(&path)
                .with_context(|| format!("Failed to load vendor HAL {}", path.display()))?;
            info!("Testing vendor HAL {}", vendor.path().display());
            (Box::new(vendor) as Box<dyn WifiHal>, Some(library))
        }
        Backend::Sim => {
            for quirk in &quirks {
                info!("Sim quirk enabled: {}", quirk.name());
            }
            let sim = quirks.into_iter().fold(SimHal::new(), SimHal::with_quirk);
            (Box::new(sim) as Box<dyn WifiHal>, None)
        }
    };

    let fixtures = load_fixtures(args, app, backend)?;

    let mut settings = app.run_settings();
    if let Some(timeout) = args.timeout {
        settings.connect_timeout = std::time::Duration::from_secs(timeout);
    }

    let ctx = TestContext::new(hal, fixtures).with_settings(settings);
    Ok((ctx, library))
}

fn load_fixtures(args: &HalArgs, app: &AppConfig, backend: Backend) -> Result<Fixtures> {
    let path = args.fixtures.clone().or_else(|| app.fixtures.clone());

    let fixtures = match path {
        Some(path) => Fixtures::load(config::expand_path(&path))?,
        None if backend == Backend::Sim => {
            info!("No fixture file given, using the sim example fixtures");
            Fixtures::example()
        }
        None => {
            warn!("No fixture file given; cases that need fixture values will fail");
            Fixtures::default()
        }
    };

    let missing = fixtures.missing_keys();
    if !missing.is_empty() {
        warn!("Fixture values missing: {}", missing.join(", "));
    }
    Ok(fixtures)
}

fn storage_for(app: &AppConfig) -> ResultsStorage {
    match app.results_dir() {
        Some(dir) => ResultsStorage::new(dir),
        None => ResultsStorage::default_dir(),
    }
}

fn parse_format(name: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(name).ok_or_else(|| {
        anyhow!("Unknown output format: {name}. Valid: table, json, json-pretty, csv, summary")
    })
}

fn run_suites(args: cli::RunArgs, config: &ConfigFile) -> Result<ExitCode> {
    let app = &config.app;
    let format = parse_format(args.format.as_deref().unwrap_or(&app.format))?;

    let registry = suites::register_all();
    for name in &args.suites {
        if registry.suite(name).is_none() {
            anyhow::bail!("Unknown suite: {name}. Use `wifi-hal-l1 list` to see the suites");
        }
    }
    for pattern in &args.tests {
        if registry.find_cases(pattern).is_empty() {
            anyhow::bail!("No case matches '{pattern}'. Use `wifi-hal-l1 list` to see the cases");
        }
    }

    let (ctx, library) = build_context(&args.hal, config)?;

    let mut skip = app.skip.clone();
    if let Some(extra) = &args.skip {
        skip.extend(
            extra
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
    }

    let mut runner = SuiteRunner::new(ctx)
        .with_skip(skip)
        .with_filter(args.tests.iter().cloned());
    for name in &args.suites {
        runner = runner.with_suite(name.as_str());
    }

    let started_at = Utc::now();
    let summary = runner.run_all(&registry);

    println!("{}", ResultFormatter::new(format).format_run(&summary));

    if let Some(output) = &args.output {
        let path = Path::new(output);
        output::write_run_to_file(path, &summary, format)?;
        info!("Results written to {}", path.display());
    }

    let exit = if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    };

    if !args.no_store {
        let mut run = StoredRun::new(summary, started_at);
        if let Some(library) = library {
            run = run.with_library(library);
        }
        match storage_for(app).save(&run) {
            Ok(_) => info!("Stored as run {}", run.id),
            Err(e) => warn!("Failed to store results: {:#}", e),
        }
    }

    Ok(exit)
}

fn run_console(args: cli::ConsoleArgs, config: &ConfigFile) -> Result<ExitCode> {
    let format = parse_format(&config.app.format).unwrap_or(OutputFormat::Table);
    let registry = suites::register_all();
    let (ctx, _) = build_context(&args.hal, config)?;
    let mut runner = SuiteRunner::new(ctx).with_skip(config.app.skip.iter().cloned());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let results = cli::Console::new(
        &mut runner,
        &registry,
        stdin.lock(),
        stdout.lock(),
        ResultFormatter::new(format),
    )
    .run()
    .context("Console I/O failed")?;
    runner.context().shutdown();

    let counts = models::StatusCounts::count(&results);
    println!(
        "Ran {} cases: {} passed, {} failed, {} errors, {} skipped",
        counts.total, counts.passed, counts.failed, counts.errors, counts.skipped
    );

    Ok(if counts.failed + counts.errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn list_cases(args: cli::ListArgs) -> Result<()> {
    let registry = suites::register_all();
    let suites: Vec<_> = match &args.suite {
        Some(name) => vec![registry
            .suite(name)
            .ok_or_else(|| anyhow!("Unknown suite: {name}"))?],
        None => registry.suites().iter().collect(),
    };

    let total: usize = suites.iter().map(|s| s.cases.len()).sum();
    println!("\nWiFi HAL L1 cases ({total} total)\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for suite in suites {
        println!("\n{} [{}] - {} cases", suite.name, suite.precondition, suite.cases.len());
        println!("──────────────────────────────────────────────────────────────────────");
        for case in &suite.cases {
            if args.detailed {
                println!("  {:<52} {:<40} {}", case.id, case.api, case.kind);
            } else {
                println!("  {}", case.id);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}

fn show_results(args: cli::ResultsArgs, app: &AppConfig) -> Result<()> {
    let storage = storage_for(app);

    let run = match (&args.id, &args.backend) {
        (Some(id), _) => storage.find(id)?,
        (None, Some(backend)) => storage
            .latest(backend)?
            .ok_or_else(|| anyhow!("No stored runs for backend {backend}"))?,
        (None, None) => {
            if args.delete || args.compare.is_some() || args.export.is_some() {
                anyhow::bail!("Give a run ID or --backend to select a run");
            }
            return list_runs(&storage);
        }
    };

    if args.delete {
        storage.delete(&run.backend, &run.id)?;
        println!("✓ Deleted run {}", run.id);
        return Ok(());
    }

    if let Some(baseline_id) = &args.compare {
        let baseline = storage.find(baseline_id)?;
        let comparison = RunComparator::compare(&baseline, &run);
        match args.format.as_str() {
            "json" => println!("{}", ComparisonFormatter::format_json(&comparison)),
            other => match ReportFormat::from_str(other) {
                Some(format) => {
                    println!("{}", ReportGenerator::new(format).comparison_report(&comparison))
                }
                None => println!("{}", ComparisonFormatter::format_table(&comparison)),
            },
        }
    } else {
        match args.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&run)?),
            other => {
                let format = ReportFormat::from_str(other).unwrap_or(ReportFormat::Text);
                println!("{}", ReportGenerator::new(format).run_report(&run))
            }
        }
    }

    if let Some(export) = &args.export {
        let path = PathBuf::from(export);
        export_run(&storage, &run, &path)?;
        println!("\n✓ Exported to: {}", path.display());
    }

    Ok(())
}

fn list_runs(storage: &ResultsStorage) -> Result<()> {
    let runs = storage.list_runs(None)?;
    if runs.is_empty() {
        println!("\nNo stored results found in {}.", storage.base_dir().display());
        println!("   Run tests with: wifi-hal-l1 run --library <path>");
        return Ok(());
    }

    println!("\n┌──────────────────────┬──────────┬──────────┬──────────┬──────────────────────┐");
    println!("│ Run ID               │ Backend  │ HAL      │ Passed   │ Started              │");
    println!("├──────────────────────┼──────────┼──────────┼──────────┼──────────────────────┤");
    for run in &runs {
        println!(
            "│ {:20} │ {:8} │ {:8} │ {:>8} │ {:20} │",
            run.id,
            run.backend,
            run.hal_version.as_deref().unwrap_or("-"),
            format!("{}/{}", run.passed, run.total),
            run.started_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("└──────────────────────┴──────────┴──────────┴──────────┴──────────────────────┘");
    println!("\nUse `wifi-hal-l1 results <run-id>` to view a run.\n");
    Ok(())
}

fn export_run(storage: &ResultsStorage, run: &StoredRun, path: &Path) -> Result<()> {
    if let Some(format) = ExportFormat::from_extension(path) {
        return storage.export(run, path, format);
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = ReportFormat::from_str(extension).ok_or_else(|| {
        anyhow!("Cannot export to '{}': use .json, .csv, .md or .txt", path.display())
    })?;
    let report = ReportGenerator::new(format).run_report(run);
    std::fs::write(path, report)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

fn manage_config(args: cli::ConfigArgs, explicit: Option<&str>) -> Result<()> {
    use cli::ConfigAction;

    match args.action {
        ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to point at your HAL library and fixtures.");
        }

        ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let config = load_config(explicit)?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| explicit.map(String::from))
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

            match ConfigFile::load(&path) {
                Ok(_) => println!("✓ Configuration file is valid: {path}"),
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        ConfigAction::Get { key, file } => {
            let config = match file {
                Some(path) => ConfigFile::load(&path)?,
                None => load_config(explicit)?,
            };

            let key = key.strip_prefix("app.").unwrap_or(&key);
            let value = match key {
                "sim_quirks" => config.sim_quirks.join(","),
                "version" => config.version.clone(),
                _ => config.app.get(key).ok_or_else(|| {
                    anyhow!(
                        "Unknown configuration key: {key}. Valid: {}, sim_quirks",
                        AppConfig::keys().join(", ")
                    )
                })?,
            };
            println!("{value}");
        }

        ConfigAction::Set { key, value, file } => {
            let path = file
                .or_else(|| explicit.map(String::from))
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
            let mut config = if Path::new(&path).exists() {
                ConfigFile::load(&path)?
            } else {
                ConfigFile::default()
            };

            let field = key.strip_prefix("app.").unwrap_or(&key);
            if field == "sim_quirks" {
                config.sim_quirks = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            } else {
                config.app.set(field, &value)?;
            }
            config.validate()?;

            config.save(&path)?;
            println!("✓ Set {key} = {value} in {path}");
        }

        ConfigAction::Env => config::print_env_help(),

        ConfigAction::Fixtures { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!("Fixture file already exists: {output}. Use --force to overwrite.");
            }

            Fixtures::example().save(path)?;
            println!("✓ Fixture file created: {output}");
            println!("\nFill in the interface name, access point credentials and scan values.");
        }
    }

    Ok(())
}
