//! `WIFI_HAL_L1_*` environment overrides
//!
//! Each variable overrides the matching config-file setting; command-line
//! flags still win.

use std::env;

const ENV_PREFIX: &str = "WIFI_HAL_L1";

/// Overrides read from the process environment
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Backend from WIFI_HAL_L1_BACKEND
    pub backend: Option<String>,
    /// Vendor library from WIFI_HAL_L1_LIBRARY
    pub library: Option<String>,
    /// Fixture file from WIFI_HAL_L1_FIXTURES
    pub fixtures: Option<String>,
    /// Config file from WIFI_HAL_L1_CONFIG
    pub config_file: Option<String>,
    /// Output format from WIFI_HAL_L1_FORMAT
    pub format: Option<String>,
    /// Connect timeout from WIFI_HAL_L1_TIMEOUT
    pub timeout: Option<u64>,
    /// Verbose from WIFI_HAL_L1_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self {
            backend: get_env("BACKEND"),
            library: get_env("LIBRARY"),
            fixtures: get_env("FIXTURES"),
            config_file: get_env("CONFIG"),
            format: get_env("FORMAT"),
            timeout: get_env_parse("TIMEOUT"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    pub fn print_summary(&self) {
        println!("WIFI_HAL_L1 overrides in effect:");
        println!("  {}_BACKEND:   {:?}", ENV_PREFIX, self.backend);
        println!("  {}_LIBRARY:   {:?}", ENV_PREFIX, self.library);
        println!("  {}_FIXTURES:  {:?}", ENV_PREFIX, self.fixtures);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_TIMEOUT:   {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_VERBOSE:   {:?}", ENV_PREFIX, self.verbose);
    }
}

/// `WIFI_HAL_L1_<name>`, empty values treated as unset
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Sets `WIFI_HAL_L1_*` variables, for tests
#[cfg(test)]
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn var(mut self, name: &str, value: String) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value));
        self
    }

    pub fn backend(self, backend: impl Into<String>) -> Self {
        self.var("BACKEND", backend.into())
    }

    pub fn library(self, library: impl Into<String>) -> Self {
        self.var("LIBRARY", library.into())
    }

    pub fn fixtures(self, fixtures: impl Into<String>) -> Self {
        self.var("FIXTURES", fixtures.into())
    }

    pub fn timeout(self, timeout: u64) -> Self {
        self.var("TIMEOUT", timeout.to_string())
    }

    pub fn verbose(self, verbose: bool) -> Self {
        self.var("VERBOSE", verbose.to_string())
    }

    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Set the variables until the returned guard drops
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

/// Restores the previous values on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all WIFI_HAL_L1 environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BACKEND    HAL backend (vendor, sim)");
    println!("  {ENV_PREFIX}_LIBRARY    Path to the vendor HAL shared library");
    println!("  {ENV_PREFIX}_FIXTURES   Path to the fixture file");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!("  {ENV_PREFIX}_FORMAT     Output format (table, json, json-pretty, csv, summary)");
    println!("  {ENV_PREFIX}_TIMEOUT    Connect callback timeout in seconds");
    println!("  {ENV_PREFIX}_VERBOSE    Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_LOG        Log filter directive (e.g. wifi_hal_l1=debug)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_LIBRARY=/usr/lib/libwifihal.so");
    println!("  export {ENV_PREFIX}_FIXTURES=./fixtures.yaml");
    println!("  wifi-hal-l1 run");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.backend.is_none());
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .backend("sim")
            .library("/opt/hal/libwifihal.so")
            .timeout(60)
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.backend, Some("sim".to_string()));
        assert_eq!(config.library, Some("/opt/hal/libwifihal.so".to_string()));
        assert_eq!(config.timeout, Some(60));
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = EnvBuilder::new().verbose(true).apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn test_guard_restores() {
        let key = format!("{ENV_PREFIX}_FIXTURES");
        {
            let _guard = EnvBuilder::new().fixtures("/tmp/f.yaml").apply_scoped();
            assert_eq!(env::var(&key).ok().as_deref(), Some("/tmp/f.yaml"));
        }
        assert!(env::var(&key).is_err());
    }
}
