//! HAL entry point catalogue
//!
//! Getter families that share a C signature are folded into parameter
//! enums; each variant still names exactly one C entry point.

/// `INT fn(INT radioIndex, CHAR *output_string)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadioStringParam {
    IfName,
    MaxBitRate,
    SupportedFrequencyBands,
    OperatingFrequencyBand,
    SupportedStandards,
    PossibleChannels,
    ChannelsInUse,
    GuardInterval,
    OperatingChannelBandwidth,
    ExtChannel,
    TransmitPowerSupported,
    RegulatoryDomain,
}

impl RadioStringParam {
    pub fn all() -> Vec<RadioStringParam> {
        vec![
            RadioStringParam::IfName,
            RadioStringParam::MaxBitRate,
            RadioStringParam::SupportedFrequencyBands,
            RadioStringParam::OperatingFrequencyBand,
            RadioStringParam::SupportedStandards,
            RadioStringParam::PossibleChannels,
            RadioStringParam::ChannelsInUse,
            RadioStringParam::GuardInterval,
            RadioStringParam::OperatingChannelBandwidth,
            RadioStringParam::ExtChannel,
            RadioStringParam::TransmitPowerSupported,
            RadioStringParam::RegulatoryDomain,
        ]
    }

    pub fn api(self) -> &'static str {
        match self {
            RadioStringParam::IfName => "wifi_getRadioIfName",
            RadioStringParam::MaxBitRate => "wifi_getRadioMaxBitRate",
            RadioStringParam::SupportedFrequencyBands => "wifi_getRadioSupportedFrequencyBands",
            RadioStringParam::OperatingFrequencyBand => "wifi_getRadioOperatingFrequencyBand",
            RadioStringParam::SupportedStandards => "wifi_getRadioSupportedStandards",
            RadioStringParam::PossibleChannels => "wifi_getRadioPossibleChannels",
            RadioStringParam::ChannelsInUse => "wifi_getRadioChannelsInUse",
            RadioStringParam::GuardInterval => "wifi_getRadioGuardInterval",
            RadioStringParam::OperatingChannelBandwidth => {
                "wifi_getRadioOperatingChannelBandwidth"
            }
            RadioStringParam::ExtChannel => "wifi_getRadioExtChannel",
            RadioStringParam::TransmitPowerSupported => "wifi_getRadioTransmitPowerSupported",
            RadioStringParam::RegulatoryDomain => "wifi_getRegulatoryDomain",
        }
    }
}

/// `INT fn(INT radioIndex, BOOL *output_bool)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadioBoolParam {
    Enable,
    Status,
    AutoChannelSupported,
    AutoChannelEnable,
    Ieee80211hSupported,
    Ieee80211hEnabled,
}

impl RadioBoolParam {
    pub fn all() -> Vec<RadioBoolParam> {
        vec![
            RadioBoolParam::Enable,
            RadioBoolParam::Status,
            RadioBoolParam::AutoChannelSupported,
            RadioBoolParam::AutoChannelEnable,
            RadioBoolParam::Ieee80211hSupported,
            RadioBoolParam::Ieee80211hEnabled,
        ]
    }

    pub fn api(self) -> &'static str {
        match self {
            RadioBoolParam::Enable => "wifi_getRadioEnable",
            RadioBoolParam::Status => "wifi_getRadioStatus",
            RadioBoolParam::AutoChannelSupported => "wifi_getRadioAutoChannelSupported",
            RadioBoolParam::AutoChannelEnable => "wifi_getRadioAutoChannelEnable",
            RadioBoolParam::Ieee80211hSupported => "wifi_getRadioIEEE80211hSupported",
            RadioBoolParam::Ieee80211hEnabled => "wifi_getRadioIEEE80211hEnabled",
        }
    }
}

/// `INT fn(INT radioIndex, ULONG *output_ulong)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadioUlongParam {
    Channel,
    AutoChannelRefreshPeriod,
}

impl RadioUlongParam {
    pub fn all() -> Vec<RadioUlongParam> {
        vec![
            RadioUlongParam::Channel,
            RadioUlongParam::AutoChannelRefreshPeriod,
        ]
    }

    pub fn api(self) -> &'static str {
        match self {
            RadioUlongParam::Channel => "wifi_getRadioChannel",
            RadioUlongParam::AutoChannelRefreshPeriod => "wifi_getRadioAutoChannelRefreshPeriod",
        }
    }
}

/// `INT fn(INT radioIndex, INT *output_int)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadioIntParam {
    Mcs,
    TransmitPower,
}

impl RadioIntParam {
    pub fn all() -> Vec<RadioIntParam> {
        vec![RadioIntParam::Mcs, RadioIntParam::TransmitPower]
    }

    pub fn api(self) -> &'static str {
        match self {
            RadioIntParam::Mcs => "wifi_getRadioMCS",
            RadioIntParam::TransmitPower => "wifi_getRadioTransmitPower",
        }
    }
}

/// `INT fn(INT ssidIndex, CHAR *output_string)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SsidStringParam {
    Name,
    MacAddress,
}

impl SsidStringParam {
    pub fn all() -> Vec<SsidStringParam> {
        vec![SsidStringParam::Name, SsidStringParam::MacAddress]
    }

    pub fn api(self) -> &'static str {
        match self {
            SsidStringParam::Name => "wifi_getSSIDName",
            SsidStringParam::MacAddress => "wifi_getSSIDMACAddress",
        }
    }
}

pub const WIFI_INIT: &str = "wifi_init";
pub const WIFI_INIT_WITH_CONFIG: &str = "wifi_initWithConfig";
pub const WIFI_UNINIT: &str = "wifi_uninit";
pub const GET_HAL_VERSION: &str = "wifi_getHalVersion";
pub const GET_STATS: &str = "wifi_getStats";
pub const GET_RADIO_NUMBER_OF_ENTRIES: &str = "wifi_getRadioNumberOfEntries";
pub const GET_SSID_NUMBER_OF_ENTRIES: &str = "wifi_getSSIDNumberOfEntries";
pub const GET_RADIO_STANDARD: &str = "wifi_getRadioStandard";
pub const GET_RADIO_TRAFFIC_STATS: &str = "wifi_getRadioTrafficStats";
pub const GET_SSID_TRAFFIC_STATS: &str = "wifi_getSSIDTrafficStats";
pub const GET_NEIGHBORING_DIAGNOSTIC: &str = "wifi_getNeighboringWiFiDiagnosticResult";
pub const GET_SPECIFIC_SSID_INFO: &str = "wifi_getSpecificSSIDInfo";
pub const SET_SCANNING_FREQ_LIST: &str = "wifi_setRadioScanningFreqList";
pub const GET_DUAL_BAND_SUPPORT: &str = "wifi_getDualBandSupport";
pub const WAIT_FOR_SCAN_RESULTS: &str = "wifi_waitForScanResults";
pub const CONNECT_ENDPOINT: &str = "wifi_connectEndpoint";
pub const DISCONNECT_ENDPOINT: &str = "wifi_disconnectEndpoint";
pub const CLEAR_SSID_INFO: &str = "wifi_clearSSIDInfo";
pub const LAST_CONNECTED_ENDPOINT: &str = "wifi_lastConnected_Endpoint";
pub const SET_ROAMING_CONTROL: &str = "wifi_setRoamingControl";
pub const GET_ROAMING_CONTROL: &str = "wifi_getRoamingControl";
pub const SET_WPS_BUTTON_PUSH: &str = "wifi_setCliWpsButtonPush";
pub const CANCEL_WPS_PAIRING: &str = "wifi_cancelWpsPairing";
pub const CONNECT_CALLBACK_REGISTER: &str = "wifi_connectEndpoint_callback_register";
pub const DISCONNECT_CALLBACK_REGISTER: &str = "wifi_disconnectEndpoint_callback_register";

/// Every HAL entry point the suites exercise, in header order
pub fn all_apis() -> Vec<&'static str> {
    let mut apis = vec![
        WIFI_INIT,
        WIFI_INIT_WITH_CONFIG,
        WIFI_UNINIT,
        GET_HAL_VERSION,
        GET_STATS,
        GET_RADIO_NUMBER_OF_ENTRIES,
        GET_SSID_NUMBER_OF_ENTRIES,
    ];
    apis.extend(RadioBoolParam::all().into_iter().map(RadioBoolParam::api));
    apis.extend(RadioStringParam::all().into_iter().map(RadioStringParam::api));
    apis.push(GET_RADIO_STANDARD);
    apis.extend(RadioUlongParam::all().into_iter().map(RadioUlongParam::api));
    apis.extend(RadioIntParam::all().into_iter().map(RadioIntParam::api));
    apis.push(GET_RADIO_TRAFFIC_STATS);
    apis.extend(SsidStringParam::all().into_iter().map(SsidStringParam::api));
    apis.extend([
        GET_SSID_TRAFFIC_STATS,
        GET_NEIGHBORING_DIAGNOSTIC,
        GET_SPECIFIC_SSID_INFO,
        SET_SCANNING_FREQ_LIST,
        GET_DUAL_BAND_SUPPORT,
        WAIT_FOR_SCAN_RESULTS,
        CONNECT_ENDPOINT,
        DISCONNECT_ENDPOINT,
        CLEAR_SSID_INFO,
        LAST_CONNECTED_ENDPOINT,
        SET_ROAMING_CONTROL,
        GET_ROAMING_CONTROL,
        SET_WPS_BUTTON_PUSH,
        CANCEL_WPS_PAIRING,
        CONNECT_CALLBACK_REGISTER,
        DISCONNECT_CALLBACK_REGISTER,
    ]);
    apis
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_api_names_unique() {
        let apis = all_apis();
        let unique: HashSet<_> = apis.iter().collect();
        assert_eq!(unique.len(), apis.len());
        assert_eq!(apis.len(), 49);
    }

    #[test]
    fn test_api_names_prefixed() {
        assert!(all_apis().iter().all(|api| api.starts_with("wifi_")));
    }
}
