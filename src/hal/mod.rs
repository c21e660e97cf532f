//! WiFi HAL under test
//!
//! [`WifiHal`] mirrors the C entry points of `wifi_common_hal.h` and
//! `wifi_client_hal.h`. Output parameters are `Option<&mut T>` and input
//! pointers are `Option<&T>`: `None` is the `NULL` pointer that negative
//! cases pass on purpose.
//!
//! ## Backends
//!
//! - [`VendorHal`] loads the vendor shared library and calls into it.
//! - [`SimHal`] is the reference behavioral model used for dry runs and
//!   for checking the suites themselves.

pub mod api;
mod sim;
mod types;
mod vendor;

pub use api::{RadioBoolParam, RadioIntParam, RadioStringParam, RadioUlongParam, SsidStringParam};
pub use sim::{SimHal, SimQuirk};
pub use types::{
    ConnectRequest, ConnectStatus, EndpointCallback, FreqBand, HalConfig, HalStatus, NeighborAp,
    PairedSsidInfo, RadioTrafficStats, RoamingCtrl, SecurityMode, SsidTrafficStats, StaStats,
};
pub use vendor::VendorHal;

/// The WiFi client/common HAL API surface
pub trait WifiHal {
    /// Short label of the backend, used in reports
    fn backend(&self) -> &str;

    // Lifecycle

    fn init(&mut self) -> HalStatus;
    fn init_with_config(&mut self, config: Option<&HalConfig>) -> HalStatus;
    fn uninit(&mut self) -> HalStatus;

    // Common HAL

    fn get_hal_version(&mut self, output: Option<&mut String>) -> HalStatus;
    fn get_stats(&mut self, radio_index: i32, output: Option<&mut StaStats>) -> HalStatus;
    fn get_radio_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus;
    fn get_ssid_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus;

    fn get_radio_bool(
        &mut self,
        param: RadioBoolParam,
        radio_index: i32,
        output: Option<&mut bool>,
    ) -> HalStatus;

    fn get_radio_string(
        &mut self,
        param: RadioStringParam,
        radio_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus;

    fn get_radio_ulong(
        &mut self,
        param: RadioUlongParam,
        radio_index: i32,
        output: Option<&mut u64>,
    ) -> HalStatus;

    fn get_radio_int(
        &mut self,
        param: RadioIntParam,
        radio_index: i32,
        output: Option<&mut i32>,
    ) -> HalStatus;

    /// `wifi_getRadioStandard`: standard string plus g-only/n-only/ac-only flags
    fn get_radio_standard(
        &mut self,
        radio_index: i32,
        output: Option<&mut String>,
        g_only: Option<&mut bool>,
        n_only: Option<&mut bool>,
        ac_only: Option<&mut bool>,
    ) -> HalStatus;

    fn get_radio_traffic_stats(
        &mut self,
        radio_index: i32,
        output: Option<&mut RadioTrafficStats>,
    ) -> HalStatus;

    fn get_ssid_string(
        &mut self,
        param: SsidStringParam,
        ssid_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus;

    fn get_ssid_traffic_stats(
        &mut self,
        ssid_index: i32,
        output: Option<&mut SsidTrafficStats>,
    ) -> HalStatus;

    fn get_neighboring_wifi_diagnostic_result(
        &mut self,
        radio_index: i32,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus;

    fn get_specific_ssid_info(
        &mut self,
        ssid: Option<&str>,
        band: FreqBand,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus;

    fn set_radio_scanning_freq_list(
        &mut self,
        radio_index: i32,
        freq_list: Option<&str>,
    ) -> HalStatus;

    fn get_dual_band_support(&mut self) -> bool;
    fn wait_for_scan_results(&mut self) -> HalStatus;

    // Client HAL

    fn connect_endpoint(&mut self, ssid_index: i32, request: &ConnectRequest) -> HalStatus;
    fn disconnect_endpoint(&mut self, ssid_index: i32, ssid: Option<&str>) -> HalStatus;
    fn clear_ssid_info(&mut self, ssid_index: i32) -> HalStatus;
    fn last_connected_endpoint(&mut self, output: Option<&mut PairedSsidInfo>) -> HalStatus;
    fn set_roaming_control(&mut self, ssid_index: i32, ctrl: Option<&RoamingCtrl>) -> HalStatus;
    fn get_roaming_control(
        &mut self,
        ssid_index: i32,
        output: Option<&mut RoamingCtrl>,
    ) -> HalStatus;
    fn set_cli_wps_button_push(&mut self, ssid_index: i32) -> HalStatus;
    fn cancel_wps_pairing(&mut self) -> HalStatus;
    fn register_connect_callback(&mut self, callback: Option<EndpointCallback>);
    fn register_disconnect_callback(&mut self, callback: Option<EndpointCallback>);
}

/// Which HAL implementation to run the suites against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Vendor,
    Sim,
}

impl Backend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vendor" | "hal" | "lib" => Some(Backend::Vendor),
            "sim" | "simulated" | "reference" => Some(Backend::Sim),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Vendor => "vendor",
            Backend::Sim => "sim",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(Backend::from_str("vendor"), Some(Backend::Vendor));
        assert_eq!(Backend::from_str("SIM"), Some(Backend::Sim));
        assert_eq!(Backend::from_str("mock"), None);
    }
}
