//! The versioned `wifi-hal-l1.yaml` file
//!
//! Searched in the working directory first, then under `~/.config`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::hal::{Backend, SimQuirk};
use crate::output::OutputFormat;
use crate::utils::LogLevel;

const CONFIG_LOCATIONS: &[&str] = &[
    "./wifi-hal-l1.yaml",
    "./.wifi-hal-l1.yaml",
    "~/.config/wifi-hal-l1/config.yaml",
];

/// On-disk configuration: app settings plus sim quirks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Format version, currently `1.0`
    #[serde(default = "default_version")]
    pub version: String,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Quirks applied when the `sim` backend runs
    #[serde(default)]
    pub sim_quirks: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            sim_quirks: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// First existing file among the standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Every existing standard location layered over the defaults, the
    /// user file first so project files override it
    pub fn load_default() -> Result<Self> {
        let found: Vec<PathBuf> = CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .filter(|path| path.exists())
            .collect();

        let mut config = Self::default();
        for path in found.iter().rev() {
            tracing::debug!("Loading config {}", path.display());
            config.merge(Self::load(path)?);
        }
        Ok(config)
    }

    /// Load and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        let app = &self.app;
        if Backend::from_str(&app.backend).is_none() {
            anyhow::bail!("Unknown backend '{}'. Valid: vendor, sim", app.backend);
        }
        if OutputFormat::from_str(&app.format).is_none() {
            anyhow::bail!(
                "Unknown output format '{}'. Valid: table, json, json-pretty, csv, summary",
                app.format
            );
        }
        if LogLevel::from_str(&app.log_level).is_none() {
            anyhow::bail!("Unknown log level '{}'", app.log_level);
        }
        if app.connect_timeout_secs == 0 || app.scan_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be at least one second");
        }

        for quirk in &self.sim_quirks {
            if SimQuirk::from_str(quirk).is_none() {
                anyhow::bail!("Unknown sim quirk '{}'", quirk);
            }
        }

        Ok(())
    }

    /// Written by `config init`
    pub fn example() -> Self {
        Self {
            version: default_version(),
            app: AppConfig {
                backend: "vendor".to_string(),
                library: Some("/usr/lib/libwifihal.so".to_string()),
                fixtures: Some("~/.config/wifi-hal-l1/fixtures.yaml".to_string()),
                connect_timeout_secs: 30,
                scan_timeout_secs: 20,
                skip: vec!["wifi_setCliWpsButtonPush_positive".to_string()],
                format: "table".to_string(),
                results_dir: None,
                log_level: "info".to_string(),
            },
            sim_quirks: Vec::new(),
        }
    }

    /// Overlay `other`: its non-default settings win, lists are unioned
    pub fn merge(&mut self, other: ConfigFile) {
        let defaults = AppConfig::default();
        let app = other.app;

        if app.backend != defaults.backend {
            self.app.backend = app.backend;
        }
        if app.library.is_some() {
            self.app.library = app.library;
        }
        if app.fixtures.is_some() {
            self.app.fixtures = app.fixtures;
        }
        if app.connect_timeout_secs != defaults.connect_timeout_secs {
            self.app.connect_timeout_secs = app.connect_timeout_secs;
        }
        if app.scan_timeout_secs != defaults.scan_timeout_secs {
            self.app.scan_timeout_secs = app.scan_timeout_secs;
        }
        if app.format != defaults.format {
            self.app.format = app.format;
        }
        if app.results_dir.is_some() {
            self.app.results_dir = app.results_dir;
        }
        if app.log_level != defaults.log_level {
            self.app.log_level = app.log_level;
        }

        for id in app.skip {
            if !self.app.skip.contains(&id) {
                self.app.skip.push(id);
            }
        }
        for quirk in other.sim_quirks {
            if !self.sim_quirks.contains(&quirk) {
                self.sim_quirks.push(quirk);
            }
        }
    }

    /// Quirks as typed values; unknown names are dropped
    pub fn quirks(&self) -> Vec<SimQuirk> {
        self.sim_quirks
            .iter()
            .filter_map(|q| SimQuirk::from_str(q))
            .collect()
    }
}

/// `~/` prefix to the home directory
pub(crate) fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.version, "1.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = ConfigFile::example();
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"version": "1.0", "app": {"backend": "mock"}}"#).unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown backend"));
    }

    #[test]
    fn test_validate_config() {
        let mut config = ConfigFile::default();
        config.sim_quirks.push("ignore-everything".to_string());
        assert!(config.validate().is_err());

        let mut config = ConfigFile::default();
        config.app.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = ConfigFile::default();
        config.version = "2.0".to_string();
        assert!(config.validate().is_err());

        let mut config = ConfigFile::default();
        config.app.scan_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge() {
        let mut base = ConfigFile::example();
        let mut other = ConfigFile::default();
        other.app.backend = "sim".to_string();
        other.app.skip = vec![
            "wifi_setCliWpsButtonPush_positive".to_string(),
            "wifi_cancelWpsPairing_positive".to_string(),
        ];
        other.sim_quirks = vec!["accept-null-output".to_string()];

        base.merge(other);
        assert_eq!(base.app.backend, "sim");
        assert_eq!(base.app.library.as_deref(), Some("/usr/lib/libwifihal.so"));
        assert_eq!(base.app.skip.len(), 2);
        assert_eq!(base.quirks(), vec![SimQuirk::AcceptNullOutput]);
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("./test.yaml");
        assert_eq!(path, PathBuf::from("./test.yaml"));
        assert!(is_yaml_file(Path::new("a.yml")));
        assert!(!is_yaml_file(Path::new("a.json")));
    }
}
