//! Simulated reference HAL
//!
//! A behavioral model of a conforming WiFi HAL. The init state machine is
//! `Uninitialized -> Initialized(default | config) -> Uninitialized`; every
//! other status-returning call fails while uninitialized, on an
//! out-of-range index, or on a `NULL` pointer.
//!
//! Quirks switch off parts of that contract so the suites can be checked
//! for the failures they are supposed to catch.

use std::collections::HashSet;
use tracing::debug;

use super::api::{RadioBoolParam, RadioIntParam, RadioStringParam, RadioUlongParam, SsidStringParam};
use super::types::{
    ConnectRequest, ConnectStatus, EndpointCallback, FreqBand, HalConfig, HalStatus, NeighborAp,
    PairedSsidInfo, RadioTrafficStats, RoamingCtrl, SecurityMode, SsidTrafficStats, StaStats,
};
use super::WifiHal;

/// `wlan_Interface` is a `char[64]`
const MAX_INTERFACE_LEN: usize = 63;

/// Deliberate deviations from the HAL contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimQuirk {
    /// Serve calls while uninitialized
    IgnoreInitState,
    /// Treat any index as radio/SSID 0
    IgnoreIndexBounds,
    /// Return `RETURN_OK` for a `NULL` output pointer
    AcceptNullOutput,
    /// Report a security mode string outside the allowed set
    BadSecurityString,
}

impl SimQuirk {
    pub fn all() -> Vec<SimQuirk> {
        vec![
            SimQuirk::IgnoreInitState,
            SimQuirk::IgnoreIndexBounds,
            SimQuirk::AcceptNullOutput,
            SimQuirk::BadSecurityString,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            SimQuirk::IgnoreInitState => "ignore-init-state",
            SimQuirk::IgnoreIndexBounds => "ignore-index-bounds",
            SimQuirk::AcceptNullOutput => "accept-null-output",
            SimQuirk::BadSecurityString => "bad-security-string",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase().replace('_', "-");
        SimQuirk::all().into_iter().find(|q| q.name() == s)
    }
}

/// Static description of one simulated radio
#[derive(Clone, Debug)]
pub struct SimRadio {
    pub if_name: String,
    pub enable: bool,
    pub status: bool,
    pub max_bit_rate: String,
    pub supported_frequency_bands: String,
    pub operating_frequency_band: String,
    pub supported_standards: String,
    pub standard: String,
    pub possible_channels: String,
    pub channels_in_use: String,
    pub channel: u64,
    pub auto_channel_supported: bool,
    pub auto_channel_enable: bool,
    pub auto_channel_refresh_period: u64,
    pub guard_interval: String,
    pub operating_channel_bandwidth: String,
    pub ext_channel: String,
    pub mcs: i32,
    pub transmit_power_supported: String,
    pub transmit_power: i32,
    pub ieee80211h_supported: bool,
    pub ieee80211h_enabled: bool,
    pub regulatory_domain: String,
    pub traffic: RadioTrafficStats,
}

impl SimRadio {
    pub fn band_2_4ghz(if_name: impl Into<String>) -> Self {
        Self {
            if_name: if_name.into(),
            enable: true,
            status: true,
            max_bit_rate: "300 Mb/s".to_string(),
            supported_frequency_bands: "2.4GHz".to_string(),
            operating_frequency_band: "2.4GHz".to_string(),
            supported_standards: "b,g,n,ax".to_string(),
            standard: "n".to_string(),
            possible_channels: "1-11".to_string(),
            channels_in_use: "1,6,11".to_string(),
            channel: 6,
            auto_channel_supported: true,
            auto_channel_enable: true,
            auto_channel_refresh_period: 3600,
            guard_interval: "Auto".to_string(),
            operating_channel_bandwidth: "20MHz".to_string(),
            ext_channel: "Auto".to_string(),
            mcs: 7,
            transmit_power_supported: "0,25,50,75,100".to_string(),
            transmit_power: 100,
            ieee80211h_supported: false,
            ieee80211h_enabled: false,
            regulatory_domain: "US ".to_string(),
            traffic: RadioTrafficStats {
                bytes_sent: 1_048_576,
                bytes_received: 4_194_304,
                packets_sent: 1200,
                packets_received: 4100,
                noise_floor: -95,
                channel_utilization: 23,
                ..Default::default()
            },
        }
    }

    pub fn band_5ghz(if_name: impl Into<String>) -> Self {
        Self {
            if_name: if_name.into(),
            max_bit_rate: "1.3 Gb/s".to_string(),
            supported_frequency_bands: "5GHz".to_string(),
            operating_frequency_band: "5GHz".to_string(),
            supported_standards: "a,n,ac,ax".to_string(),
            standard: "ac".to_string(),
            possible_channels: "36,40,44,48,149,153,157,161".to_string(),
            channels_in_use: "36,149".to_string(),
            channel: 36,
            operating_channel_bandwidth: "80MHz".to_string(),
            ext_channel: "AboveControlChannel".to_string(),
            mcs: 9,
            ieee80211h_supported: true,
            ieee80211h_enabled: true,
            ..Self::band_2_4ghz("")
        }
    }
}

/// A network visible to the simulated radios
#[derive(Clone, Debug)]
pub struct SimNetwork {
    pub ap: NeighborAp,
    pub radio_index: usize,
    pub security: SecurityMode,
    /// Passphrase, WEP key, or EAP identity depending on `security`
    pub secret: String,
}

impl SimNetwork {
    pub fn new(
        ssid: impl Into<String>,
        bssid: impl Into<String>,
        radio_index: usize,
        security: SecurityMode,
        secret: impl Into<String>,
    ) -> Self {
        let (band, channel, standards, bandwidth) = if radio_index == 0 {
            ("2.4GHz", 6, "b,g,n", "20MHz")
        } else {
            ("5GHz", 36, "a,n,ac", "80MHz")
        };
        Self {
            ap: NeighborAp {
                ssid: ssid.into(),
                bssid: bssid.into(),
                mode: "Infrastructure".to_string(),
                channel,
                signal_strength: -52,
                security_mode_enabled: security_mode_string(security).to_string(),
                encryption_mode: encryption_string(security).to_string(),
                operating_frequency_band: band.to_string(),
                supported_standards: standards.to_string(),
                operating_standards: standards.rsplit(',').next().unwrap_or("n").to_string(),
                operating_channel_bandwidth: bandwidth.to_string(),
                beacon_period: 100,
                noise: -92,
                basic_data_transfer_rates: "1,2,5.5,11".to_string(),
                supported_data_transfer_rates: "1,2,5.5,6,9,11,12,18,24,36,48,54".to_string(),
                dtim_period: 1,
                channel_utilization: 18,
            },
            radio_index,
            security,
            secret: secret.into(),
        }
    }

    fn accepts(&self, request: &ConnectRequest) -> bool {
        let secret = Some(self.secret.as_str());
        let mode = request.security_mode;
        match self.security {
            SecurityMode::None => mode == SecurityMode::None,
            s if s.is_wep() => mode.is_wep() && request.wep_key.as_deref() == secret,
            s if s.is_personal() => {
                mode.is_personal()
                    && (request.key_passphrase.as_deref() == secret
                        || request.pre_shared_key.as_deref() == secret)
            }
            s if s.is_enterprise() => {
                mode.is_enterprise() && request.eap_identity.as_deref() == secret
            }
            _ => false,
        }
    }

    fn band(&self) -> FreqBand {
        if self.radio_index == 0 {
            FreqBand::Band2_4GHz
        } else {
            FreqBand::Band5GHz
        }
    }
}

/// Everything the simulated HAL reports
#[derive(Clone, Debug)]
pub struct SimProfile {
    pub hal_version: String,
    pub radios: Vec<SimRadio>,
    pub ssids: Vec<(String, String)>,
    pub networks: Vec<SimNetwork>,
    pub dual_band: bool,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            hal_version: "3.0".to_string(),
            radios: vec![SimRadio::band_2_4ghz("wlan0"), SimRadio::band_5ghz("wlan1")],
            ssids: vec![("l1-client".to_string(), "a0:b1:c2:d3:e4:f5".to_string())],
            networks: vec![
                SimNetwork::new(
                    "l1-test-ap",
                    "10:20:30:40:50:60",
                    0,
                    SecurityMode::Wpa2PskAes,
                    "l1-test-passphrase",
                ),
                SimNetwork::new(
                    "l1-test-ap-5g",
                    "10:20:30:40:50:61",
                    1,
                    SecurityMode::Wpa3Sae,
                    "l1-test-passphrase-5g",
                ),
                SimNetwork::new("l1-open-ap", "10:20:30:40:50:62", 0, SecurityMode::None, ""),
                SimNetwork::new(
                    "l1-enterprise-ap",
                    "10:20:30:40:50:63",
                    1,
                    SecurityMode::Wpa2EnterpriseAes,
                    "l1-user@example.com",
                ),
            ],
            dual_band: true,
        }
    }
}

impl SimProfile {
    /// Add a network, replacing one with the same SSID
    pub fn with_network(mut self, network: SimNetwork) -> Self {
        self.networks.retain(|n| n.ap.ssid != network.ap.ssid);
        self.networks.push(network);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum InitState {
    Uninitialized,
    Initialized { interface: Option<String> },
}

/// Simulated HAL
pub struct SimHal {
    profile: SimProfile,
    quirks: HashSet<SimQuirk>,
    state: InitState,
    scan_freqs: Vec<Vec<u32>>,
    connection: Option<PairedSsidInfo>,
    saved: Option<PairedSsidInfo>,
    roaming: Vec<RoamingCtrl>,
    wps_in_progress: bool,
    connect_callback: Option<EndpointCallback>,
    disconnect_callback: Option<EndpointCallback>,
}

impl SimHal {
    pub fn new() -> Self {
        Self::with_profile(SimProfile::default())
    }

    pub fn with_profile(profile: SimProfile) -> Self {
        let radios = profile.radios.len();
        let ssids = profile.ssids.len();
        Self {
            profile,
            quirks: HashSet::new(),
            state: InitState::Uninitialized,
            scan_freqs: vec![Vec::new(); radios],
            connection: None,
            saved: None,
            roaming: vec![RoamingCtrl::typical(); ssids],
            wps_in_progress: false,
            connect_callback: None,
            disconnect_callback: None,
        }
    }

    pub fn with_quirk(mut self, quirk: SimQuirk) -> Self {
        self.quirks.insert(quirk);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.state != InitState::Uninitialized
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn has(&self, quirk: SimQuirk) -> bool {
        self.quirks.contains(&quirk)
    }

    fn ready(&self) -> bool {
        self.is_initialized() || self.has(SimQuirk::IgnoreInitState)
    }

    fn resolve(&self, index: i32, len: usize) -> Option<usize> {
        match usize::try_from(index) {
            Ok(i) if i < len => Some(i),
            _ if self.has(SimQuirk::IgnoreIndexBounds) && len > 0 => Some(0),
            _ => None,
        }
    }

    fn radio(&self, index: i32) -> Option<&SimRadio> {
        self.resolve(index, self.profile.radios.len())
            .map(|i| &self.profile.radios[i])
    }

    fn ssid_slot(&self, index: i32) -> Option<usize> {
        self.resolve(index, self.profile.ssids.len())
    }

    fn write<T>(&self, output: Option<&mut T>, value: T) -> HalStatus {
        match output {
            Some(slot) => {
                *slot = value;
                HalStatus::Ok
            }
            None if self.has(SimQuirk::AcceptNullOutput) => HalStatus::Ok,
            None => HalStatus::Err,
        }
    }

    fn security_string(&self, mode: &str) -> String {
        if self.has(SimQuirk::BadSecurityString) {
            "WPA9-Personal".to_string()
        } else {
            mode.to_string()
        }
    }

    fn write_aps(
        &self,
        found: Vec<NeighborAp>,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus {
        let found: Vec<NeighborAp> = found
            .into_iter()
            .map(|mut ap| {
                ap.security_mode_enabled = self.security_string(&ap.security_mode_enabled);
                ap
            })
            .collect();
        let n = found.len() as u32;
        match (aps, count) {
            (Some(aps), Some(count)) => {
                *aps = found;
                *count = n;
                HalStatus::Ok
            }
            _ if self.has(SimQuirk::AcceptNullOutput) => HalStatus::Ok,
            _ => HalStatus::Err,
        }
    }

    fn fire(callback: &Option<EndpointCallback>, ssid_index: i32, ssid: &str, status: ConnectStatus) {
        if let Some(callback) = callback.clone() {
            callback(ssid_index, ssid, status);
        }
    }
}

impl Default for SimHal {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiHal for SimHal {
    fn backend(&self) -> &str {
        "sim"
    }

    fn init(&mut self) -> HalStatus {
        if self.is_initialized() {
            return HalStatus::Err;
        }
        self.state = InitState::Initialized { interface: None };
        debug!("sim: initialized with default configuration");
        HalStatus::Ok
    }

    fn init_with_config(&mut self, config: Option<&HalConfig>) -> HalStatus {
        let Some(config) = config else {
            return HalStatus::Err;
        };
        let interface = config.wlan_interface.trim();
        if self.is_initialized() || interface.is_empty() || interface.len() > MAX_INTERFACE_LEN {
            return HalStatus::Err;
        }
        self.state = InitState::Initialized {
            interface: Some(interface.to_string()),
        };
        debug!("sim: initialized on interface {}", interface);
        HalStatus::Ok
    }

    fn uninit(&mut self) -> HalStatus {
        if !self.is_initialized() {
            return HalStatus::Err;
        }
        self.state = InitState::Uninitialized;
        self.connection = None;
        self.wps_in_progress = false;
        self.roaming = vec![RoamingCtrl::typical(); self.profile.ssids.len()];
        self.scan_freqs = vec![Vec::new(); self.profile.radios.len()];
        debug!("sim: uninitialized");
        HalStatus::Ok
    }

    fn get_hal_version(&mut self, output: Option<&mut String>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        self.write(output, self.profile.hal_version.clone())
    }

    fn get_stats(&mut self, radio_index: i32, output: Option<&mut StaStats>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };

        let connected = self.connection.as_ref().and_then(|c| {
            self.profile
                .networks
                .iter()
                .find(|n| n.ap.ssid == c.ssid)
        });
        let stats = match connected {
            Some(network) => StaStats {
                ssid: network.ap.ssid.clone(),
                bssid: network.ap.bssid.clone(),
                band: network.ap.operating_frequency_band.clone(),
                sec_mode: self.security_string(&network.ap.security_mode_enabled),
                encryption: network.ap.encryption_mode.clone(),
                phy_rate: 144.4,
                noise: network.ap.noise as f32,
                rssi: network.ap.signal_strength as f32,
                frequency: channel_frequency(network.ap.channel),
                last_data_downlink_rate: 130_000,
                last_data_uplink_rate: 86_000,
                retransmissions: 3,
            },
            None => StaStats {
                band: radio.operating_frequency_band.clone(),
                sec_mode: self.security_string("None"),
                encryption: "None".to_string(),
                ..Default::default()
            },
        };
        self.write(output, stats)
    }

    fn get_radio_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        self.write(output, self.profile.radios.len() as u64)
    }

    fn get_ssid_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        self.write(output, self.profile.ssids.len() as u64)
    }

    fn get_radio_bool(
        &mut self,
        param: RadioBoolParam,
        radio_index: i32,
        output: Option<&mut bool>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        let value = match param {
            RadioBoolParam::Enable => radio.enable,
            RadioBoolParam::Status => radio.status,
            RadioBoolParam::AutoChannelSupported => radio.auto_channel_supported,
            RadioBoolParam::AutoChannelEnable => radio.auto_channel_enable,
            RadioBoolParam::Ieee80211hSupported => radio.ieee80211h_supported,
            RadioBoolParam::Ieee80211hEnabled => radio.ieee80211h_enabled,
        };
        self.write(output, value)
    }

    fn get_radio_string(
        &mut self,
        param: RadioStringParam,
        radio_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        let value = match param {
            RadioStringParam::IfName => match (&self.state, radio_index) {
                (InitState::Initialized { interface: Some(name) }, 0) => name.clone(),
                _ => radio.if_name.clone(),
            },
            RadioStringParam::MaxBitRate => radio.max_bit_rate.clone(),
            RadioStringParam::SupportedFrequencyBands => radio.supported_frequency_bands.clone(),
            RadioStringParam::OperatingFrequencyBand => radio.operating_frequency_band.clone(),
            RadioStringParam::SupportedStandards => radio.supported_standards.clone(),
            RadioStringParam::PossibleChannels => radio.possible_channels.clone(),
            RadioStringParam::ChannelsInUse => radio.channels_in_use.clone(),
            RadioStringParam::GuardInterval => radio.guard_interval.clone(),
            RadioStringParam::OperatingChannelBandwidth => {
                radio.operating_channel_bandwidth.clone()
            }
            RadioStringParam::ExtChannel => radio.ext_channel.clone(),
            RadioStringParam::TransmitPowerSupported => radio.transmit_power_supported.clone(),
            RadioStringParam::RegulatoryDomain => radio.regulatory_domain.clone(),
        };
        self.write(output, value)
    }

    fn get_radio_ulong(
        &mut self,
        param: RadioUlongParam,
        radio_index: i32,
        output: Option<&mut u64>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        let value = match param {
            RadioUlongParam::Channel => radio.channel,
            RadioUlongParam::AutoChannelRefreshPeriod => radio.auto_channel_refresh_period,
        };
        self.write(output, value)
    }

    fn get_radio_int(
        &mut self,
        param: RadioIntParam,
        radio_index: i32,
        output: Option<&mut i32>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        let value = match param {
            RadioIntParam::Mcs => radio.mcs,
            RadioIntParam::TransmitPower => radio.transmit_power,
        };
        self.write(output, value)
    }

    fn get_radio_standard(
        &mut self,
        radio_index: i32,
        output: Option<&mut String>,
        g_only: Option<&mut bool>,
        n_only: Option<&mut bool>,
        ac_only: Option<&mut bool>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        let standard = radio.standard.clone();
        let flags = [
            (g_only, standard == "g"),
            (n_only, standard == "n"),
            (ac_only, standard == "ac"),
        ];
        if flags.iter().any(|(slot, _)| slot.is_none()) && !self.has(SimQuirk::AcceptNullOutput) {
            return HalStatus::Err;
        }
        for (slot, value) in flags {
            if let Some(slot) = slot {
                *slot = value;
            }
        }
        self.write(output, standard)
    }

    fn get_radio_traffic_stats(
        &mut self,
        radio_index: i32,
        output: Option<&mut RadioTrafficStats>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(radio) = self.radio(radio_index) else {
            return HalStatus::Err;
        };
        self.write(output, radio.traffic)
    }

    fn get_ssid_string(
        &mut self,
        param: SsidStringParam,
        ssid_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(slot) = self.ssid_slot(ssid_index) else {
            return HalStatus::Err;
        };
        let (name, mac) = &self.profile.ssids[slot];
        let value = match param {
            SsidStringParam::Name => self
                .connection
                .as_ref()
                .map(|c| c.ssid.clone())
                .unwrap_or_else(|| name.clone()),
            SsidStringParam::MacAddress => mac.clone(),
        };
        self.write(output, value)
    }

    fn get_ssid_traffic_stats(
        &mut self,
        ssid_index: i32,
        output: Option<&mut SsidTrafficStats>,
    ) -> HalStatus {
        if !self.ready() || self.ssid_slot(ssid_index).is_none() {
            return HalStatus::Err;
        }
        let stats = SsidTrafficStats {
            bytes_sent: 524_288,
            bytes_received: 2_097_152,
            packets_sent: 600,
            packets_received: 2000,
            retrans_count: 4,
            unicast_packets_sent: 580,
            unicast_packets_received: 1900,
            broadcast_packets_received: 100,
            ..Default::default()
        };
        self.write(output, stats)
    }

    fn get_neighboring_wifi_diagnostic_result(
        &mut self,
        radio_index: i32,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(index) = self.resolve(radio_index, self.profile.radios.len()) else {
            return HalStatus::Err;
        };
        let found = self
            .profile
            .networks
            .iter()
            .filter(|n| n.radio_index == index)
            .map(|n| n.ap.clone())
            .collect();
        self.write_aps(found, aps, count)
    }

    fn get_specific_ssid_info(
        &mut self,
        ssid: Option<&str>,
        band: FreqBand,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(ssid) = ssid.filter(|s| !s.is_empty()) else {
            return HalStatus::Err;
        };
        let found = self
            .profile
            .networks
            .iter()
            .filter(|n| n.ap.ssid == ssid)
            .filter(|n| band == FreqBand::None || n.band() == band)
            .map(|n| n.ap.clone())
            .collect();
        self.write_aps(found, aps, count)
    }

    fn set_radio_scanning_freq_list(
        &mut self,
        radio_index: i32,
        freq_list: Option<&str>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(index) = self.resolve(radio_index, self.profile.radios.len()) else {
            return HalStatus::Err;
        };
        let Some(freqs) = freq_list.and_then(parse_freq_list) else {
            return HalStatus::Err;
        };
        debug!("sim: radio {} scanning {:?}", index, freqs);
        self.scan_freqs[index] = freqs;
        HalStatus::Ok
    }

    fn get_dual_band_support(&mut self) -> bool {
        self.profile.dual_band
    }

    fn wait_for_scan_results(&mut self) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        HalStatus::Ok
    }

    fn connect_endpoint(&mut self, ssid_index: i32, request: &ConnectRequest) -> HalStatus {
        if !self.ready() || self.ssid_slot(ssid_index).is_none() {
            return HalStatus::Err;
        }
        let Some(ssid) = request.ssid.as_deref().filter(|s| !s.is_empty()) else {
            return HalStatus::Err;
        };
        if !credentials_well_formed(request) {
            return HalStatus::Err;
        }

        let network = self.profile.networks.iter().find(|n| n.ap.ssid == ssid);
        let outcome = match network {
            None => ConnectStatus::ErrorNotFound,
            Some(n) if !n.accepts(request) => ConnectStatus::ErrorInvalidCredentials,
            Some(_) => ConnectStatus::Connected,
        };

        if outcome == ConnectStatus::Connected {
            let info = network.map(|n| PairedSsidInfo {
                ssid: n.ap.ssid.clone(),
                bssid: n.ap.bssid.clone(),
                security: n.ap.security_mode_enabled.clone(),
                passphrase: request.key_passphrase.clone().unwrap_or_default(),
                wep_key: request.wep_key.clone().unwrap_or_default(),
            });
            if request.save_ssid != 0 {
                self.saved = info.clone();
            }
            self.connection = info;
        }

        debug!("sim: connect {} -> {:?}", ssid, outcome);
        Self::fire(&self.connect_callback, ssid_index, ssid, outcome);
        HalStatus::Ok
    }

    fn disconnect_endpoint(&mut self, ssid_index: i32, ssid: Option<&str>) -> HalStatus {
        if !self.ready() || self.ssid_slot(ssid_index).is_none() {
            return HalStatus::Err;
        }
        let Some(ssid) = ssid else {
            return HalStatus::Err;
        };
        if self.connection.take().is_some() {
            Self::fire(
                &self.disconnect_callback,
                ssid_index,
                ssid,
                ConnectStatus::Disconnected,
            );
        }
        HalStatus::Ok
    }

    fn clear_ssid_info(&mut self, ssid_index: i32) -> HalStatus {
        if !self.ready() || self.ssid_slot(ssid_index).is_none() {
            return HalStatus::Err;
        }
        self.saved = None;
        HalStatus::Ok
    }

    fn last_connected_endpoint(&mut self, output: Option<&mut PairedSsidInfo>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        match self.saved.clone() {
            Some(info) => self.write(output, info),
            None => HalStatus::Err,
        }
    }

    fn set_roaming_control(&mut self, ssid_index: i32, ctrl: Option<&RoamingCtrl>) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let (Some(slot), Some(ctrl)) = (self.ssid_slot(ssid_index), ctrl) else {
            return HalStatus::Err;
        };
        if !roaming_in_range(ctrl) {
            return HalStatus::Err;
        }
        self.roaming[slot] = *ctrl;
        HalStatus::Ok
    }

    fn get_roaming_control(
        &mut self,
        ssid_index: i32,
        output: Option<&mut RoamingCtrl>,
    ) -> HalStatus {
        if !self.ready() {
            return HalStatus::Err;
        }
        let Some(slot) = self.ssid_slot(ssid_index) else {
            return HalStatus::Err;
        };
        self.write(output, self.roaming[slot])
    }

    fn set_cli_wps_button_push(&mut self, ssid_index: i32) -> HalStatus {
        if !self.ready() || self.ssid_slot(ssid_index).is_none() {
            return HalStatus::Err;
        }
        self.wps_in_progress = true;
        HalStatus::Ok
    }

    fn cancel_wps_pairing(&mut self) -> HalStatus {
        if !self.ready() || !self.wps_in_progress {
            return HalStatus::Err;
        }
        self.wps_in_progress = false;
        HalStatus::Ok
    }

    fn register_connect_callback(&mut self, callback: Option<EndpointCallback>) {
        self.connect_callback = callback;
    }

    fn register_disconnect_callback(&mut self, callback: Option<EndpointCallback>) {
        self.disconnect_callback = callback;
    }
}

/// TR-181 style `ModeEnabled` string for a security mode
fn security_mode_string(mode: SecurityMode) -> &'static str {
    match mode {
        SecurityMode::None => "None",
        SecurityMode::Wep64 => "WEP-64",
        SecurityMode::Wep128 => "WEP-128",
        SecurityMode::WpaPskTkip | SecurityMode::WpaPskAes => "WPA-Personal",
        SecurityMode::Wpa2PskTkip | SecurityMode::Wpa2PskAes => "WPA2-Personal",
        SecurityMode::WpaWpa2Psk => "WPA-WPA2-Personal",
        SecurityMode::Wpa3PskAes | SecurityMode::Wpa3Sae => "WPA3-Personal",
        SecurityMode::WpaEnterpriseTkip | SecurityMode::WpaEnterpriseAes => "WPA-Enterprise",
        SecurityMode::Wpa2EnterpriseTkip | SecurityMode::Wpa2EnterpriseAes => "WPA2-Enterprise",
        SecurityMode::WpaWpa2Enterprise => "WPA-WPA2-Enterprise",
        SecurityMode::NotSupported => "None",
    }
}

fn encryption_string(mode: SecurityMode) -> &'static str {
    match mode {
        SecurityMode::None | SecurityMode::NotSupported => "None",
        SecurityMode::Wep64 | SecurityMode::Wep128 => "WEP",
        SecurityMode::WpaPskTkip
        | SecurityMode::Wpa2PskTkip
        | SecurityMode::WpaEnterpriseTkip
        | SecurityMode::Wpa2EnterpriseTkip => "TKIP",
        SecurityMode::WpaWpa2Psk | SecurityMode::WpaWpa2Enterprise => "TKIP+AES",
        _ => "AES",
    }
}

fn credentials_well_formed(request: &ConnectRequest) -> bool {
    let mode = request.security_mode;
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    if mode == SecurityMode::None {
        return true;
    }
    if mode.is_wep() {
        return request
            .wep_key
            .as_deref()
            .is_some_and(|k| matches!(k.len(), 5 | 10 | 13 | 26));
    }
    if mode.is_personal() {
        let passphrase_ok = request
            .key_passphrase
            .as_deref()
            .is_some_and(|p| (8..=63).contains(&p.chars().count()));
        let psk_ok = request
            .pre_shared_key
            .as_deref()
            .is_some_and(|k| k.len() == 64 && k.chars().all(|c| c.is_ascii_hexdigit()));
        return passphrase_ok || psk_ok;
    }
    if mode.is_enterprise() {
        return present(&request.eap_identity) && present(&request.ca_root_cert);
    }
    false
}

fn roaming_in_range(ctrl: &RoamingCtrl) -> bool {
    let flag = |v: i32| v == 0 || v == 1;
    let rssi = |v: i32| (-100..=0).contains(&v);
    let delta = |v: i32| (0..=100).contains(&v);

    flag(ctrl.roaming_enable)
        && flag(ctrl.self_steer_override)
        && flag(ctrl.roam_80211kvr_enable)
        && rssi(ctrl.preassn_best_threshold)
        && rssi(ctrl.post_assn_self_steer_threshold)
        && rssi(ctrl.post_assn_ap_ctrl_threshold)
        && delta(ctrl.preassn_best_delta)
        && delta(ctrl.post_assn_level_delta_connected)
        && delta(ctrl.post_assn_level_delta_disconnected)
        && ctrl.post_assn_self_steer_timeframe >= 0
        && ctrl.post_assn_back_off_time >= 0
        && ctrl.post_assn_ap_ctrl_timeframe >= 0
}

/// Parse a space- or comma-separated list of channel centre frequencies (MHz)
fn parse_freq_list(list: &str) -> Option<Vec<u32>> {
    let freqs: Vec<u32> = list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u32>().ok().filter(|f| is_channel_frequency(*f)))
        .collect::<Option<_>>()?;
    if freqs.is_empty() {
        None
    } else {
        Some(freqs)
    }
}

fn is_channel_frequency(freq: u32) -> bool {
    match freq {
        2484 => true,
        2412..=2472 => (freq - 2412) % 5 == 0,
        5180..=5885 => freq % 5 == 0,
        5955..=7115 => (freq - 5955) % 20 == 0,
        _ => false,
    }
}

fn channel_frequency(channel: u32) -> i32 {
    match channel {
        14 => 2484,
        1..=13 => 2407 + 5 * channel as i32,
        _ => 5000 + 5 * channel as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_init_state_machine() {
        let mut hal = SimHal::new();
        assert_eq!(hal.uninit(), HalStatus::Err);
        assert_eq!(hal.init(), HalStatus::Ok);
        assert_eq!(hal.init(), HalStatus::Err);
        assert_eq!(hal.uninit(), HalStatus::Ok);
        assert_eq!(
            hal.init_with_config(Some(&HalConfig::new("wlan0"))),
            HalStatus::Ok
        );
        assert_eq!(hal.init(), HalStatus::Err);
        assert_eq!(hal.uninit(), HalStatus::Ok);
        assert!(!hal.is_initialized());
    }

    #[test]
    fn test_init_with_config_rejects_bad_config() {
        let mut hal = SimHal::new();
        assert_eq!(hal.init_with_config(None), HalStatus::Err);
        assert_eq!(hal.init_with_config(Some(&HalConfig::new(""))), HalStatus::Err);
        let long = "w".repeat(64);
        assert_eq!(hal.init_with_config(Some(&HalConfig::new(long))), HalStatus::Err);
        assert!(!hal.is_initialized());
    }

    #[test]
    fn test_calls_fail_while_uninitialized() {
        let mut hal = SimHal::new();
        let mut channel = 0;
        assert_eq!(
            hal.get_radio_ulong(RadioUlongParam::Channel, 0, Some(&mut channel)),
            HalStatus::Err
        );
        hal.init();
        assert_eq!(
            hal.get_radio_ulong(RadioUlongParam::Channel, 0, Some(&mut channel)),
            HalStatus::Ok
        );
        assert_eq!(channel, 6);
    }

    #[test]
    fn test_index_and_null_checks() {
        let mut hal = SimHal::new();
        hal.init();
        let mut name = String::new();
        assert_eq!(
            hal.get_radio_string(RadioStringParam::IfName, 2, Some(&mut name)),
            HalStatus::Err
        );
        assert_eq!(
            hal.get_radio_string(RadioStringParam::IfName, -1, Some(&mut name)),
            HalStatus::Err
        );
        assert_eq!(
            hal.get_radio_string(RadioStringParam::IfName, 0, None),
            HalStatus::Err
        );
    }

    #[test]
    fn test_if_name_follows_config() {
        let mut hal = SimHal::new();
        hal.init_with_config(Some(&HalConfig::new("wlp2s0")));
        let mut name = String::new();
        hal.get_radio_string(RadioStringParam::IfName, 0, Some(&mut name));
        assert_eq!(name, "wlp2s0");
    }

    #[test]
    fn test_quirks_relax_contract() {
        let mut hal = SimHal::new()
            .with_quirk(SimQuirk::IgnoreInitState)
            .with_quirk(SimQuirk::IgnoreIndexBounds)
            .with_quirk(SimQuirk::AcceptNullOutput);
        let mut channel = 0;
        assert_eq!(
            hal.get_radio_ulong(RadioUlongParam::Channel, 42, Some(&mut channel)),
            HalStatus::Ok
        );
        assert_eq!(
            hal.get_radio_ulong(RadioUlongParam::Channel, 0, None),
            HalStatus::Ok
        );
        assert_eq!(SimQuirk::from_str("ignore_init_state"), Some(SimQuirk::IgnoreInitState));
    }

    #[test]
    fn test_connect_fires_callback_and_saves() {
        let mut hal = SimHal::new();
        hal.init();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        hal.register_connect_callback(Some(Arc::new(move |_: i32, ssid: &str, status: ConnectStatus| {
            sink.lock().unwrap().push((ssid.to_string(), status));
        })));

        let request = ConnectRequest::new("l1-test-ap", SecurityMode::Wpa2PskAes)
            .passphrase("l1-test-passphrase");
        assert_eq!(hal.connect_endpoint(0, &request), HalStatus::Ok);
        assert!(hal.is_connected());

        let wrong = ConnectRequest::new("l1-test-ap", SecurityMode::Wpa2PskAes)
            .passphrase("not-the-passphrase");
        assert_eq!(hal.connect_endpoint(0, &wrong), HalStatus::Ok);

        let events = events.lock().unwrap();
        assert_eq!(events[0], ("l1-test-ap".to_string(), ConnectStatus::Connected));
        assert_eq!(events[1].1, ConnectStatus::ErrorInvalidCredentials);

        let mut info = PairedSsidInfo::default();
        assert_eq!(hal.last_connected_endpoint(Some(&mut info)), HalStatus::Ok);
        assert_eq!(info.ssid, "l1-test-ap");
        assert_eq!(hal.clear_ssid_info(0), HalStatus::Ok);
        assert_eq!(hal.last_connected_endpoint(Some(&mut info)), HalStatus::Err);
    }

    #[test]
    fn test_connect_rejects_malformed_credentials() {
        let mut hal = SimHal::new();
        hal.init();
        let short = ConnectRequest::new("l1-test-ap", SecurityMode::Wpa2PskAes).passphrase("short");
        assert_eq!(hal.connect_endpoint(0, &short), HalStatus::Err);
        let unsupported = ConnectRequest::new("l1-test-ap", SecurityMode::NotSupported);
        assert_eq!(hal.connect_endpoint(0, &unsupported), HalStatus::Err);
        let mut no_ssid = ConnectRequest::new("x", SecurityMode::None);
        no_ssid.ssid = None;
        assert_eq!(hal.connect_endpoint(0, &no_ssid), HalStatus::Err);
    }

    #[test]
    fn test_roaming_round_trip_and_range() {
        let mut hal = SimHal::new();
        hal.init();
        let mut ctrl = RoamingCtrl::typical();
        ctrl.preassn_best_delta = 5;
        assert_eq!(hal.set_roaming_control(0, Some(&ctrl)), HalStatus::Ok);
        let mut read = RoamingCtrl::default();
        assert_eq!(hal.get_roaming_control(0, Some(&mut read)), HalStatus::Ok);
        assert_eq!(read, ctrl);

        ctrl.preassn_best_threshold = 10;
        assert_eq!(hal.set_roaming_control(0, Some(&ctrl)), HalStatus::Err);
        assert_eq!(hal.set_roaming_control(0, None), HalStatus::Err);
    }

    #[test]
    fn test_wps_cancel_requires_pairing() {
        let mut hal = SimHal::new();
        hal.init();
        assert_eq!(hal.cancel_wps_pairing(), HalStatus::Err);
        assert_eq!(hal.set_cli_wps_button_push(0), HalStatus::Ok);
        assert_eq!(hal.cancel_wps_pairing(), HalStatus::Ok);
    }

    #[test]
    fn test_freq_list_parsing() {
        assert_eq!(parse_freq_list("2412 2437,2462"), Some(vec![2412, 2437, 2462]));
        assert_eq!(parse_freq_list("5180"), Some(vec![5180]));
        assert_eq!(parse_freq_list("2413"), None);
        assert_eq!(parse_freq_list("abc"), None);
        assert_eq!(parse_freq_list(""), None);
    }

    #[test]
    fn test_specific_ssid_filters_band() {
        let mut hal = SimHal::new();
        hal.init();
        let mut aps = Vec::new();
        let mut count = 0;
        assert_eq!(
            hal.get_specific_ssid_info(
                Some("l1-test-ap"),
                FreqBand::Band2_4GHz,
                Some(&mut aps),
                Some(&mut count)
            ),
            HalStatus::Ok
        );
        assert_eq!(count, 1);
        hal.get_specific_ssid_info(
            Some("l1-test-ap"),
            FreqBand::Band5GHz,
            Some(&mut aps),
            Some(&mut count),
        );
        assert_eq!(count, 0);
    }
}
