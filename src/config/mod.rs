//! Configuration module
//!
//! Application settings, the versioned config file, environment overrides
//! and the fixture file cases read their inputs from.
//!
//! Precedence: command-line flag > environment variable > config file >
//! default.

mod env;
mod file;
pub mod fixtures;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;
pub(crate) use file::expand_path;
pub use fixtures::Fixtures;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::executor::RunSettings;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default backend (`vendor` or `sim`)
    pub backend: String,

    /// Path of the vendor HAL shared library
    pub library: Option<String>,

    /// Path of the fixture file
    pub fixtures: Option<String>,

    /// How long to wait for a connect/disconnect callback
    pub connect_timeout_secs: u64,

    /// Upper bound for `wifi_waitForScanResults`
    pub scan_timeout_secs: u64,

    /// Case ids (or `suite/case` patterns) reported as skipped
    pub skip: Vec<String>,

    /// Default output format
    pub format: String,

    /// Where stored runs live; the data directory when unset
    pub results_dir: Option<String>,

    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: "vendor".to_string(),
            library: None,
            fixtures: None,
            connect_timeout_secs: 30,
            scan_timeout_secs: 20,
            skip: Vec::new(),
            format: "table".to_string(),
            results_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Apply `WIFI_HAL_L1_*` overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(backend) = &env.backend {
            self.backend = backend.clone();
        }
        if let Some(library) = &env.library {
            self.library = Some(library.clone());
        }
        if let Some(fixtures) = &env.fixtures {
            self.fixtures = Some(fixtures.clone());
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(timeout) = env.timeout {
            self.connect_timeout_secs = timeout;
        }
        if env.verbose == Some(true) {
            self.log_level = "debug".to_string();
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            scan_timeout: Duration::from_secs(self.scan_timeout_secs),
        }
    }

    pub fn results_dir(&self) -> Option<PathBuf> {
        self.results_dir.as_deref().map(file::expand_path)
    }

    /// Read a setting by its key, as printed by `config get`
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "backend" => self.backend.clone(),
            "library" => self.library.clone().unwrap_or_default(),
            "fixtures" => self.fixtures.clone().unwrap_or_default(),
            "connect_timeout_secs" => self.connect_timeout_secs.to_string(),
            "scan_timeout_secs" => self.scan_timeout_secs.to_string(),
            "skip" => self.skip.join(","),
            "format" => self.format.clone(),
            "results_dir" => self.results_dir.clone().unwrap_or_default(),
            "log_level" => self.log_level.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Update a setting by its key; empty values clear optional settings
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            "backend" => self.backend = value.to_string(),
            "library" => self.library = optional(value),
            "fixtures" => self.fixtures = optional(value),
            "connect_timeout_secs" => {
                self.connect_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: {value}"))?
            }
            "scan_timeout_secs" => {
                self.scan_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: {value}"))?
            }
            "skip" => {
                self.skip = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            "format" => self.format = value.to_string(),
            "results_dir" => self.results_dir = optional(value),
            "log_level" => self.log_level = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "backend",
            "library",
            "fixtures",
            "connect_timeout_secs",
            "scan_timeout_secs",
            "skip",
            "format",
            "results_dir",
            "log_level",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend, "vendor");
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.run_settings().scan_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wifi-hal-l1.yaml");
        std::fs::write(
            &path,
            "app:\n  backend: sim\n  skip: [wifi_cancelWpsPairing_positive]\n",
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap().app;
        assert_eq!(config.backend, "sim");
        assert_eq!(config.skip, vec!["wifi_cancelWpsPairing_positive"]);
        assert_eq!(config.format, "table");
    }

    #[test]
    fn test_apply_env() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            backend: Some("sim".to_string()),
            timeout: Some(5),
            verbose: Some(true),
            ..Default::default()
        };
        config.apply_env(&env);
        assert_eq!(config.backend, "sim");
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.format, "table");
    }

    #[test]
    fn test_get_set() {
        let mut config = AppConfig::default();
        config.set("skip", "a, b,,c").unwrap();
        assert_eq!(config.get("skip").as_deref(), Some("a,b,c"));

        config.set("library", "/tmp/libhal.so").unwrap();
        config.set("library", "").unwrap();
        assert_eq!(config.library, None);

        assert!(config.set("connect_timeout_secs", "soon").is_err());
        assert!(config.set("channel", "6").is_err());
        assert!(config.get("channel").is_none());
        for key in AppConfig::keys() {
            assert!(config.get(key).is_some(), "{key}");
        }
    }
}
