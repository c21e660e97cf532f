//! Persistence of completed runs
//!
//! Runs are stored as JSON under `<base>/<backend>/<run-id>.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::RunSummary;

/// A run as persisted on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    pub backend: String,

    /// Vendor library path, when the vendor backend ran
    pub library: Option<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    pub summary: RunSummary,

    pub environment: EnvironmentInfo,
}

/// Host the run executed on
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub arch: String,
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl StoredRun {
    pub fn new(summary: RunSummary, started_at: DateTime<Utc>) -> Self {
        Self {
            id: generate_run_id(),
            backend: summary.backend.clone(),
            library: None,
            started_at,
            completed_at: Utc::now(),
            summary,
            environment: EnvironmentInfo::default(),
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn info(&self) -> RunInfo {
        RunInfo {
            id: self.id.clone(),
            backend: self.backend.clone(),
            hal_version: self.summary.hal_version.clone(),
            started_at: self.started_at,
            total: self.summary.counts.total,
            passed: self.summary.counts.passed,
            pass_rate: self.summary.pass_rate(),
        }
    }
}

/// `YYYYmmdd_HHMMSS_NNNN`, unique enough for one machine
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Reads and writes stored runs under `base_dir`
pub struct ResultsStorage {
    base_dir: PathBuf,
}

impl ResultsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<data_dir>/wifi-hal-l1/results`
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wifi-hal-l1")
            .join("results");
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn backend_dir(&self, backend: &str) -> PathBuf {
        self.base_dir.join(backend.to_lowercase())
    }

    fn run_path(&self, backend: &str, run_id: &str) -> PathBuf {
        self.backend_dir(backend).join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        let backend_dir = self.backend_dir(&run.backend);
        fs::create_dir_all(&backend_dir)
            .with_context(|| format!("Failed to create {}", backend_dir.display()))?;

        let path = self.run_path(&run.backend, &run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved test results to {}", path.display());
        Ok(path)
    }

    /// Load a run
    pub fn load(&self, backend: &str, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(backend, run_id);
        let run = self
            .load_from_path(&path)
            .with_context(|| format!("Run {run_id} not found for backend {backend}"))?;
        debug!("Loaded test results from {}", path.display());
        Ok(run)
    }

    /// Load a run without knowing its backend
    pub fn find(&self, run_id: &str) -> Result<StoredRun> {
        for backend in self.list_backends()? {
            if self.run_path(&backend, run_id).exists() {
                return self.load(&backend, run_id);
            }
        }
        anyhow::bail!("Run not found: {}", run_id)
    }

    pub fn load_from_path(&self, path: &Path) -> Result<StoredRun> {
        let file = File::open(path).context("Failed to open results file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Failed to parse results")
    }

    /// All runs of a backend, newest first
    pub fn load_backend(&self, backend: &str) -> Result<Vec<StoredRun>> {
        let backend_dir = self.backend_dir(backend);
        if !backend_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&backend_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => debug!("Failed to load {}: {}", path.display(), e),
                }
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    /// Backends with stored results
    pub fn list_backends(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backends = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    backends.push(name.to_string());
                }
            }
        }

        backends.sort();
        Ok(backends)
    }

    /// Runs of one backend, or of every backend, newest first
    pub fn list_runs(&self, backend: Option<&str>) -> Result<Vec<RunInfo>> {
        let backends = match backend {
            Some(b) => vec![b.to_string()],
            None => self.list_backends()?,
        };

        let mut runs = Vec::new();
        for backend in backends {
            runs.extend(self.load_backend(&backend)?.iter().map(StoredRun::info));
        }
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    /// Latest run of a backend
    pub fn latest(&self, backend: &str) -> Result<Option<StoredRun>> {
        let runs = self.load_backend(backend)?;
        Ok(runs.into_iter().next())
    }

    /// Delete a run
    pub fn delete(&self, backend: &str, run_id: &str) -> Result<()> {
        let path = self.run_path(backend, run_id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted results: {}", path.display());
        }
        Ok(())
    }

    /// Export run to a file
    pub fn export(&self, run: &StoredRun, path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), run)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;

                writer.write_record([
                    "run_id",
                    "suite",
                    "case_id",
                    "api",
                    "kind",
                    "status",
                    "duration_ms",
                    "message",
                    "location",
                ])?;

                for result in run.summary.results() {
                    writer.write_record([
                        run.id.clone(),
                        result.suite.clone(),
                        result.case_id.clone(),
                        result.api.clone(),
                        result.kind.to_string(),
                        result.status.to_string(),
                        result.duration_ms.to_string(),
                        result.message.clone().unwrap_or_default(),
                        result.location.clone().unwrap_or_default(),
                    ])?;
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Brief run information
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub backend: String,
    pub hal_version: Option<String>,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub pass_rate: f64,
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Precondition, SuiteSummary, TestCase, TestResult};
    use tempfile::tempdir;

    /// A run with one case per `(case_id, passed)` pair
    pub(crate) fn stored_run(backend: &str, cases: &[(&str, bool)]) -> StoredRun {
        let suite = "L1 wifi-hal init";
        let results = cases
            .iter()
            .map(|(id, passed)| {
                let case = TestCase::positive(*id, "wifi_getRadioChannel", "", |_| Ok(()));
                if *passed {
                    TestResult::pass(suite, &case, 1)
                } else {
                    TestResult::fail(suite, &case, 1, "expected RETURN_OK")
                }
            })
            .collect();
        let summary = RunSummary::new(
            backend,
            vec![SuiteSummary::new(suite, Precondition::Init, results)],
        );
        StoredRun::new(summary, Utc::now())
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id();
        assert_eq!(id.len(), "20240101_120000_0000".len());
        assert!(id.chars().all(|c| c.is_ascii_digit() || c == '_'));
    }

    #[test]
    fn test_save_load_latest() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        let mut older = stored_run("sim", &[("a", true)]);
        older.started_at = Utc::now() - chrono::Duration::hours(1);
        older.id = "older".to_string();
        let newer = stored_run("sim", &[("a", false)]).with_library("/tmp/libhal.so");

        let path = storage.save(&older).unwrap();
        assert!(path.ends_with("sim/older.json"));
        storage.save(&newer).unwrap();

        let loaded = storage.load("sim", &newer.id).unwrap();
        assert_eq!(loaded.library.as_deref(), Some("/tmp/libhal.so"));
        assert_eq!(storage.latest("sim").unwrap().unwrap().id, newer.id);
        assert_eq!(storage.find("older").unwrap().summary.counts.passed, 1);
        assert_eq!(storage.list_backends().unwrap(), vec!["sim"]);

        let runs = storage.list_runs(None).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, newer.id);

        storage.delete("sim", "older").unwrap();
        assert!(storage.find("older").is_err());
    }

    #[test]
    fn test_empty_storage() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path().join("absent"));
        assert!(storage.list_runs(None).unwrap().is_empty());
        assert!(storage.latest("vendor").unwrap().is_none());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let run = stored_run("sim", &[("a", true), ("b", false)]);

        let path = dir.path().join("run.csv");
        storage.export(&run, &path, ExportFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][2], "b");
        assert_eq!(&rows[1][5], "FAIL");
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("json"), Some(ExportFormat::Json));
        assert_eq!(
            ExportFormat::from_extension(Path::new("out.CSV")),
            Some(ExportFormat::Csv)
        );
        assert!(ExportFormat::from_str("unknown").is_none());
    }
}
