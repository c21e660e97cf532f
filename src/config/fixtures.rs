//! Test fixture file
//!
//! Values the cases feed into the HAL: interface name, indices, access point
//! credentials, scan parameters. Every field is optional; a case that needs
//! an absent value fails with "fixture value missing".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hal::{FreqBand, SecurityMode};

/// Used when the fixture file does not name an invalid index
pub const DEFAULT_INVALID_INDEX: i32 = 8;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to write fixture file {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPointFixture {
    pub ssid: Option<String>,
    /// `wifiSecurityMode_t` name, e.g. `WPA2_PSK_AES`
    pub security_mode: Option<String>,
    pub passphrase: Option<String>,
    pub psk: Option<String>,
    pub wep_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnterpriseFixture {
    pub ssid: Option<String>,
    pub security_mode: Option<String>,
    pub eap_identity: Option<String>,
    pub ca_root_cert: Option<String>,
    pub client_cert: Option<String>,
    pub private_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanFixture {
    pub freq_list: Option<String>,
    pub specific_ssid: Option<String>,
    pub band: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub interface: Option<String>,
    pub radio_index: Option<i32>,
    pub ssid_index: Option<i32>,
    pub invalid_index: Option<i32>,
    pub access_point: AccessPointFixture,
    pub enterprise: EnterpriseFixture,
    pub scan: ScanFixture,
}

impl Fixtures {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if is_json_file(path) {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| FixtureError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FixtureError> {
        let path = path.as_ref();
        let write_err = |message: String| FixtureError::Write {
            path: path.to_path_buf(),
            message,
        };

        let content = if is_json_file(path) {
            serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?
        } else {
            serde_yaml::to_string(self).map_err(|e| write_err(e.to_string()))?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| write_err(e.to_string()))
    }

    /// Values matching the networks of the simulated HAL
    pub fn example() -> Self {
        Self {
            interface: Some("wlan0".to_string()),
            radio_index: Some(0),
            ssid_index: Some(0),
            invalid_index: Some(DEFAULT_INVALID_INDEX),
            access_point: AccessPointFixture {
                ssid: Some("l1-test-ap".to_string()),
                security_mode: Some("WPA2_PSK_AES".to_string()),
                passphrase: Some("l1-test-passphrase".to_string()),
                psk: None,
                wep_key: None,
            },
            enterprise: EnterpriseFixture {
                ssid: Some("l1-enterprise-ap".to_string()),
                security_mode: Some("WPA2_ENTERPRISE_AES".to_string()),
                eap_identity: Some("l1-user@example.com".to_string()),
                ca_root_cert: Some("/etc/ssl/certs/l1-ca.pem".to_string()),
                client_cert: Some("/etc/ssl/certs/l1-client.pem".to_string()),
                private_key: Some("/etc/ssl/private/l1-client.key".to_string()),
            },
            scan: ScanFixture {
                freq_list: Some("2412 2437 2462".to_string()),
                specific_ssid: Some("l1-test-ap".to_string()),
                band: Some("2.4GHz".to_string()),
            },
        }
    }

    pub fn radio_index(&self) -> i32 {
        self.radio_index.unwrap_or(0)
    }

    pub fn ssid_index(&self) -> i32 {
        self.ssid_index.unwrap_or(0)
    }

    pub fn invalid_index(&self) -> i32 {
        self.invalid_index.unwrap_or(DEFAULT_INVALID_INDEX)
    }

    /// `None` when absent or not a known security mode
    pub fn ap_security_mode(&self) -> Option<SecurityMode> {
        self.access_point
            .security_mode
            .as_deref()
            .and_then(SecurityMode::from_str)
    }

    pub fn enterprise_security_mode(&self) -> Option<SecurityMode> {
        self.enterprise
            .security_mode
            .as_deref()
            .and_then(SecurityMode::from_str)
    }

    /// Absent band means "any band"
    pub fn scan_band(&self) -> Option<FreqBand> {
        match self.scan.band.as_deref() {
            None => Some(FreqBand::None),
            Some(band) => FreqBand::from_str(band),
        }
    }

    /// Keys that are unset, in dotted form
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let checks = [
            ("interface", self.interface.is_none()),
            ("access_point.ssid", self.access_point.ssid.is_none()),
            ("access_point.security_mode", self.access_point.security_mode.is_none()),
            ("enterprise.ssid", self.enterprise.ssid.is_none()),
            ("enterprise.eap_identity", self.enterprise.eap_identity.is_none()),
            ("enterprise.ca_root_cert", self.enterprise.ca_root_cert.is_none()),
            ("scan.freq_list", self.scan.freq_list.is_none()),
            ("scan.specific_ssid", self.scan.specific_ssid.is_none()),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(key, _)| key)
            .collect()
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixtures.yaml");
        std::fs::write(&path, "interface: wlan1\naccess_point:\n  ssid: home\n").unwrap();

        let fixtures = Fixtures::load(&path).unwrap();
        assert_eq!(fixtures.interface.as_deref(), Some("wlan1"));
        assert_eq!(fixtures.access_point.ssid.as_deref(), Some("home"));
        assert_eq!(fixtures.access_point.passphrase, None);
        assert_eq!(fixtures.radio_index(), 0);
        assert_eq!(fixtures.invalid_index(), DEFAULT_INVALID_INDEX);
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("fixtures.json");

        let fixtures = Fixtures::example();
        fixtures.save(&path).unwrap();
        assert_eq!(Fixtures::load(&path).unwrap(), fixtures);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = Fixtures::load(dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(FixtureError::Read { .. })));

        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "radio_index: [not, a, number]").unwrap();
        assert!(matches!(Fixtures::load(&path), Err(FixtureError::Parse { .. })));
    }

    #[test]
    fn test_typed_accessors() {
        let fixtures = Fixtures::example();
        assert_eq!(fixtures.ap_security_mode(), Some(SecurityMode::Wpa2PskAes));
        assert_eq!(
            fixtures.enterprise_security_mode(),
            Some(SecurityMode::Wpa2EnterpriseAes)
        );
        assert_eq!(fixtures.scan_band(), Some(FreqBand::Band2_4GHz));
        assert!(fixtures.missing_keys().is_empty());
        assert!(Fixtures::default().missing_keys().contains(&"interface"));
    }
}
