//! HAL data types
//!
//! Rust mirrors of the structs and enums declared by `wifi_common_hal.h`
//! and `wifi_client_hal.h`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Return code of a HAL entry point (`RETURN_OK` / `RETURN_ERR`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HalStatus {
    Ok,
    Err,
}

impl HalStatus {
    pub const RETURN_OK: i32 = 0;
    pub const RETURN_ERR: i32 = -1;

    /// Map a raw C return code. Anything other than `RETURN_OK` is an error.
    pub fn from_raw(code: i32) -> Self {
        if code == Self::RETURN_OK {
            HalStatus::Ok
        } else {
            HalStatus::Err
        }
    }

    pub fn is_ok(self) -> bool {
        self == HalStatus::Ok
    }
}

impl fmt::Display for HalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalStatus::Ok => write!(f, "RETURN_OK"),
            HalStatus::Err => write!(f, "RETURN_ERR"),
        }
    }
}

/// `wifi_halConfig_t`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalConfig {
    pub wlan_interface: String,
}

impl HalConfig {
    pub fn new(wlan_interface: impl Into<String>) -> Self {
        Self {
            wlan_interface: wlan_interface.into(),
        }
    }
}

/// `wifiSecurityMode_t`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityMode {
    None,
    Wep64,
    Wep128,
    WpaPskTkip,
    WpaPskAes,
    Wpa2PskTkip,
    Wpa2PskAes,
    WpaEnterpriseTkip,
    WpaEnterpriseAes,
    Wpa2EnterpriseTkip,
    Wpa2EnterpriseAes,
    WpaWpa2Psk,
    WpaWpa2Enterprise,
    Wpa3PskAes,
    Wpa3Sae,
    NotSupported,
}

impl SecurityMode {
    pub fn all() -> Vec<SecurityMode> {
        vec![
            SecurityMode::None,
            SecurityMode::Wep64,
            SecurityMode::Wep128,
            SecurityMode::WpaPskTkip,
            SecurityMode::WpaPskAes,
            SecurityMode::Wpa2PskTkip,
            SecurityMode::Wpa2PskAes,
            SecurityMode::WpaEnterpriseTkip,
            SecurityMode::WpaEnterpriseAes,
            SecurityMode::Wpa2EnterpriseTkip,
            SecurityMode::Wpa2EnterpriseAes,
            SecurityMode::WpaWpa2Psk,
            SecurityMode::WpaWpa2Enterprise,
            SecurityMode::Wpa3PskAes,
            SecurityMode::Wpa3Sae,
            SecurityMode::NotSupported,
        ]
    }

    /// Value of the C enumerator
    pub fn to_raw(self) -> i32 {
        match self {
            SecurityMode::None => 0,
            SecurityMode::Wep64 => 1,
            SecurityMode::Wep128 => 2,
            SecurityMode::WpaPskTkip => 3,
            SecurityMode::WpaPskAes => 4,
            SecurityMode::Wpa2PskTkip => 5,
            SecurityMode::Wpa2PskAes => 6,
            SecurityMode::WpaEnterpriseTkip => 7,
            SecurityMode::WpaEnterpriseAes => 8,
            SecurityMode::Wpa2EnterpriseTkip => 9,
            SecurityMode::Wpa2EnterpriseAes => 10,
            SecurityMode::WpaWpa2Psk => 11,
            SecurityMode::WpaWpa2Enterprise => 12,
            SecurityMode::Wpa3PskAes => 13,
            SecurityMode::Wpa3Sae => 14,
            SecurityMode::NotSupported => 99,
        }
    }

    /// C enumerator name
    pub fn name(self) -> &'static str {
        match self {
            SecurityMode::None => "WIFI_SECURITY_NONE",
            SecurityMode::Wep64 => "WIFI_SECURITY_WEP_64",
            SecurityMode::Wep128 => "WIFI_SECURITY_WEP_128",
            SecurityMode::WpaPskTkip => "WIFI_SECURITY_WPA_PSK_TKIP",
            SecurityMode::WpaPskAes => "WIFI_SECURITY_WPA_PSK_AES",
            SecurityMode::Wpa2PskTkip => "WIFI_SECURITY_WPA2_PSK_TKIP",
            SecurityMode::Wpa2PskAes => "WIFI_SECURITY_WPA2_PSK_AES",
            SecurityMode::WpaEnterpriseTkip => "WIFI_SECURITY_WPA_ENTERPRISE_TKIP",
            SecurityMode::WpaEnterpriseAes => "WIFI_SECURITY_WPA_ENTERPRISE_AES",
            SecurityMode::Wpa2EnterpriseTkip => "WIFI_SECURITY_WPA2_ENTERPRISE_TKIP",
            SecurityMode::Wpa2EnterpriseAes => "WIFI_SECURITY_WPA2_ENTERPRISE_AES",
            SecurityMode::WpaWpa2Psk => "WIFI_SECURITY_WPA_WPA2_PSK",
            SecurityMode::WpaWpa2Enterprise => "WIFI_SECURITY_WPA_WPA2_ENTERPRISE",
            SecurityMode::Wpa3PskAes => "WIFI_SECURITY_WPA3_PSK_AES",
            SecurityMode::Wpa3Sae => "WIFI_SECURITY_WPA3_SAE",
            SecurityMode::NotSupported => "WIFI_SECURITY_NOT_SUPPORTED",
        }
    }

    /// Parse the C enumerator name, with or without the `WIFI_SECURITY_` prefix
    pub fn from_str(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase().replace('-', "_");
        let short = upper.strip_prefix("WIFI_SECURITY_").unwrap_or(&upper);
        SecurityMode::all()
            .into_iter()
            .find(|mode| mode.name().trim_start_matches("WIFI_SECURITY_") == short)
    }

    pub fn is_wep(self) -> bool {
        matches!(self, SecurityMode::Wep64 | SecurityMode::Wep128)
    }

    pub fn is_personal(self) -> bool {
        matches!(
            self,
            SecurityMode::WpaPskTkip
                | SecurityMode::WpaPskAes
                | SecurityMode::Wpa2PskTkip
                | SecurityMode::Wpa2PskAes
                | SecurityMode::WpaWpa2Psk
                | SecurityMode::Wpa3PskAes
                | SecurityMode::Wpa3Sae
        )
    }

    pub fn is_enterprise(self) -> bool {
        matches!(
            self,
            SecurityMode::WpaEnterpriseTkip
                | SecurityMode::WpaEnterpriseAes
                | SecurityMode::Wpa2EnterpriseTkip
                | SecurityMode::Wpa2EnterpriseAes
                | SecurityMode::WpaWpa2Enterprise
        )
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// `WIFI_HAL_FREQ_BAN`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreqBand {
    #[default]
    None,
    Band2_4GHz,
    Band5GHz,
}

impl FreqBand {
    pub fn to_raw(self) -> i32 {
        match self {
            FreqBand::None => 0,
            FreqBand::Band2_4GHz => 1,
            FreqBand::Band5GHz => 2,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Some(FreqBand::None),
            "2.4ghz" | "2.4" | "24ghz" => Some(FreqBand::Band2_4GHz),
            "5ghz" | "5" => Some(FreqBand::Band5GHz),
            _ => None,
        }
    }

    /// Band label as it appears in `ap_OperatingFrequencyBand`
    pub fn label(self) -> Option<&'static str> {
        match self {
            FreqBand::None => None,
            FreqBand::Band2_4GHz => Some("2.4GHz"),
            FreqBand::Band5GHz => Some("5GHz"),
        }
    }
}

/// `wifiStatusCode_t`, delivered to connect/disconnect callbacks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectStatus {
    Success,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    UnrecoverableError,
    ErrorNotFound,
    ErrorTimeoutExpired,
    ErrorDevDisconnect,
    ErrorSsidChanged,
    ErrorConnectionLost,
    ErrorConnectionFailed,
    ErrorConnectionInterrupted,
    ErrorInvalidCredentials,
    ErrorAuthFailed,
    ErrorUnknown,
}

impl ConnectStatus {
    pub fn to_raw(self) -> i32 {
        match self {
            ConnectStatus::Success => 0,
            ConnectStatus::Connecting => 20,
            ConnectStatus::Connected => 21,
            ConnectStatus::Disconnecting => 22,
            ConnectStatus::Disconnected => 23,
            ConnectStatus::UnrecoverableError => 24,
            ConnectStatus::ErrorNotFound => 40,
            ConnectStatus::ErrorTimeoutExpired => 41,
            ConnectStatus::ErrorDevDisconnect => 42,
            ConnectStatus::ErrorSsidChanged => 43,
            ConnectStatus::ErrorConnectionLost => 44,
            ConnectStatus::ErrorConnectionFailed => 45,
            ConnectStatus::ErrorConnectionInterrupted => 46,
            ConnectStatus::ErrorInvalidCredentials => 47,
            ConnectStatus::ErrorAuthFailed => 48,
            ConnectStatus::ErrorUnknown => 60,
        }
    }

    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ConnectStatus::Success,
            20 => ConnectStatus::Connecting,
            21 => ConnectStatus::Connected,
            22 => ConnectStatus::Disconnecting,
            23 => ConnectStatus::Disconnected,
            24 => ConnectStatus::UnrecoverableError,
            40 => ConnectStatus::ErrorNotFound,
            41 => ConnectStatus::ErrorTimeoutExpired,
            42 => ConnectStatus::ErrorDevDisconnect,
            43 => ConnectStatus::ErrorSsidChanged,
            44 => ConnectStatus::ErrorConnectionLost,
            45 => ConnectStatus::ErrorConnectionFailed,
            46 => ConnectStatus::ErrorConnectionInterrupted,
            47 => ConnectStatus::ErrorInvalidCredentials,
            48 => ConnectStatus::ErrorAuthFailed,
            _ => ConnectStatus::ErrorUnknown,
        }
    }

    pub fn is_error(self) -> bool {
        self.to_raw() >= 40 || self == ConnectStatus::UnrecoverableError
    }
}

/// Connect or disconnect callback. The HAL may call it from any thread.
pub type EndpointCallback = Arc<dyn Fn(i32, &str, ConnectStatus) + Send + Sync>;

/// `wifi_sta_stats_t`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaStats {
    pub ssid: String,
    pub bssid: String,
    pub band: String,
    pub sec_mode: String,
    pub encryption: String,
    pub phy_rate: f32,
    pub noise: f32,
    pub rssi: f32,
    pub frequency: i32,
    pub last_data_downlink_rate: i32,
    pub last_data_uplink_rate: i32,
    pub retransmissions: i32,
}

/// `wifi_roamingCtrl_t`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoamingCtrl {
    pub roaming_enable: i32,
    pub self_steer_override: i32,
    pub roam_80211kvr_enable: i32,
    pub preassn_best_threshold: i32,
    pub preassn_best_delta: i32,
    pub post_assn_level_delta_connected: i32,
    pub post_assn_level_delta_disconnected: i32,
    pub post_assn_self_steer_threshold: i32,
    pub post_assn_self_steer_timeframe: i32,
    pub post_assn_back_off_time: i32,
    pub post_assn_ap_ctrl_threshold: i32,
    pub post_assn_ap_ctrl_timeframe: i32,
}

impl RoamingCtrl {
    /// A typical, in-range configuration
    pub fn typical() -> Self {
        Self {
            roaming_enable: 1,
            self_steer_override: 0,
            roam_80211kvr_enable: 1,
            preassn_best_threshold: -67,
            preassn_best_delta: 3,
            post_assn_level_delta_connected: 12,
            post_assn_level_delta_disconnected: 8,
            post_assn_self_steer_threshold: -75,
            post_assn_self_steer_timeframe: 60,
            post_assn_back_off_time: 30,
            post_assn_ap_ctrl_threshold: -75,
            post_assn_ap_ctrl_timeframe: 60,
        }
    }
}

/// `wifi_pairedSSIDInfo_t`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedSsidInfo {
    pub ssid: String,
    pub bssid: String,
    pub security: String,
    pub passphrase: String,
    pub wep_key: String,
}

/// `wifi_neighbor_ap_t`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborAp {
    pub ssid: String,
    pub bssid: String,
    pub mode: String,
    pub channel: u32,
    pub signal_strength: i32,
    pub security_mode_enabled: String,
    pub encryption_mode: String,
    pub operating_frequency_band: String,
    pub supported_standards: String,
    pub operating_standards: String,
    pub operating_channel_bandwidth: String,
    pub beacon_period: u32,
    pub noise: i32,
    pub basic_data_transfer_rates: String,
    pub supported_data_transfer_rates: String,
    pub dtim_period: u32,
    pub channel_utilization: u32,
}

/// `wifi_radioTrafficStats_t`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioTrafficStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors_sent: u64,
    pub errors_received: u64,
    pub discard_packets_sent: u64,
    pub discard_packets_received: u64,
    pub plcp_error_count: u64,
    pub fcs_error_count: u64,
    pub invalid_mac_count: u64,
    pub packets_other_received: u64,
    pub noise_floor: i32,
    pub channel_utilization: u64,
    pub activity_factor: i32,
    pub carrier_sense_threshold_exceeded: i32,
    pub retransmission_metric: i32,
    pub maximum_noise_floor_on_channel: i32,
    pub minimum_noise_floor_on_channel: i32,
    pub median_noise_floor_on_channel: i32,
    pub statistics_start_time: u64,
}

/// `wifi_ssidTrafficStats_t`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsidTrafficStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub retrans_count: u64,
    pub failed_retrans_count: u64,
    pub retry_count: u64,
    pub multiple_retry_count: u64,
    pub ack_failure_count: u64,
    pub aggregated_packet_count: u64,
    pub errors_sent: u64,
    pub errors_received: u64,
    pub unicast_packets_sent: u64,
    pub unicast_packets_received: u64,
    pub discarded_packets_sent: u64,
    pub discarded_packets_received: u64,
    pub multicast_packets_sent: u64,
    pub multicast_packets_received: u64,
    pub broadcast_packets_sent: u64,
    pub broadcast_packets_received: u64,
    pub unknown_packets_received: u64,
}

/// Arguments of `wifi_connectEndpoint` after the SSID index.
///
/// `None` in a string field is passed to the HAL as `NULL`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectRequest {
    pub ssid: Option<String>,
    pub security_mode: SecurityMode,
    pub wep_key: Option<String>,
    pub pre_shared_key: Option<String>,
    pub key_passphrase: Option<String>,
    pub save_ssid: i32,
    pub eap_identity: Option<String>,
    pub ca_root_cert: Option<String>,
    pub client_cert: Option<String>,
    pub private_key: Option<String>,
}

impl ConnectRequest {
    /// Request with every string argument present but empty
    pub fn new(ssid: impl Into<String>, security_mode: SecurityMode) -> Self {
        Self {
            ssid: Some(ssid.into()),
            security_mode,
            wep_key: Some(String::new()),
            pre_shared_key: Some(String::new()),
            key_passphrase: Some(String::new()),
            save_ssid: 1,
            eap_identity: Some(String::new()),
            ca_root_cert: Some(String::new()),
            client_cert: Some(String::new()),
            private_key: Some(String::new()),
        }
    }

    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.key_passphrase = Some(passphrase.into());
        self
    }

    pub fn psk(mut self, psk: impl Into<String>) -> Self {
        self.pre_shared_key = Some(psk.into());
        self
    }

    pub fn wep_key(mut self, key: impl Into<String>) -> Self {
        self.wep_key = Some(key.into());
        self
    }

    pub fn enterprise(
        mut self,
        eap_identity: impl Into<String>,
        ca_root_cert: impl Into<String>,
        client_cert: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        self.eap_identity = Some(eap_identity.into());
        self.ca_root_cert = Some(ca_root_cert.into());
        self.client_cert = Some(client_cert.into());
        self.private_key = Some(private_key.into());
        self
    }

    pub fn save(mut self, save_ssid: bool) -> Self {
        self.save_ssid = i32::from(save_ssid);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_status_from_raw() {
        assert_eq!(HalStatus::from_raw(0), HalStatus::Ok);
        assert_eq!(HalStatus::from_raw(-1), HalStatus::Err);
        assert_eq!(HalStatus::from_raw(7), HalStatus::Err);
    }

    #[test]
    fn test_security_mode_parse() {
        assert_eq!(
            SecurityMode::from_str("WIFI_SECURITY_WPA2_PSK_AES"),
            Some(SecurityMode::Wpa2PskAes)
        );
        assert_eq!(
            SecurityMode::from_str("wpa3-sae"),
            Some(SecurityMode::Wpa3Sae)
        );
        assert_eq!(SecurityMode::from_str("WPA4"), None);
        assert_eq!(SecurityMode::NotSupported.to_raw(), 99);
    }

    #[test]
    fn test_security_mode_classes() {
        assert!(SecurityMode::Wep128.is_wep());
        assert!(SecurityMode::Wpa3Sae.is_personal());
        assert!(SecurityMode::WpaWpa2Enterprise.is_enterprise());
        assert!(!SecurityMode::None.is_personal());
    }

    #[test]
    fn test_connect_status_codes() {
        assert_eq!(ConnectStatus::from_raw(21), ConnectStatus::Connected);
        assert_eq!(ConnectStatus::from_raw(999), ConnectStatus::ErrorUnknown);
        assert!(ConnectStatus::ErrorInvalidCredentials.is_error());
        assert!(!ConnectStatus::Disconnected.is_error());
    }

    #[test]
    fn test_freq_band_parse() {
        assert_eq!(FreqBand::from_str("2.4GHz"), Some(FreqBand::Band2_4GHz));
        assert_eq!(FreqBand::from_str("5GHz"), Some(FreqBand::Band5GHz));
        assert_eq!(FreqBand::from_str("60GHz"), None);
    }

    #[test]
    fn test_connect_request_builder() {
        let req = ConnectRequest::new("home", SecurityMode::Wpa2PskAes)
            .passphrase("secret-passphrase")
            .save(false);
        assert_eq!(req.key_passphrase.as_deref(), Some("secret-passphrase"));
        assert_eq!(req.save_ssid, 0);
    }
}
