//! Logging setup
//!
//! Log lines go to stderr so that `--format json` output on stdout stays
//! machine-readable.

use std::fmt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive
pub const LOG_ENV: &str = "WIFI_HAL_L1_LOG";

/// Log level configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `-v` count to level; no flag keeps `fallback`
    pub fn from_verbosity(verbose: u8, fallback: LogLevel) -> Self {
        match verbose {
            0 => fallback,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tracing_level().as_str().to_lowercase())
    }
}

fn build_filter(level: LogLevel, directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("wifi_hal_l1={}", level.to_tracing_level())))
}

/// Initialize the global subscriber. `WIFI_HAL_L1_LOG` overrides `level`.
pub fn init_logger(level: LogLevel) {
    let directive = std::env::var(LOG_ENV).ok();
    let filter = build_filter(level, directive.as_deref());

    // A second initialization (console re-entry, tests) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0, LogLevel::Warn), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(1, LogLevel::Warn), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(3, LogLevel::Warn), LogLevel::Trace);
    }

    #[test]
    fn test_filter_directive() {
        let filter = build_filter(LogLevel::Warn, None);
        assert!(filter.to_string().to_lowercase().contains("wifi_hal_l1=warn"));

        let custom = build_filter(LogLevel::Warn, Some("wifi_hal_l1=trace"));
        assert!(custom.to_string().to_lowercase().contains("trace"));
    }
}
