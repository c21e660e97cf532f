//! Vendor HAL backend
//!
//! Opens the vendor shared object and resolves every entry point up front.
//! Output buffers are sized as the C headers declare them; `None` outputs
//! and inputs are passed as `NULL`.

use libc::{c_char, c_int, c_uchar, c_uint, c_ulong};
use libloading::Library;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::api::{self, RadioBoolParam, RadioIntParam, RadioStringParam, RadioUlongParam, SsidStringParam};
use super::types::{
    ConnectRequest, ConnectStatus, EndpointCallback, FreqBand, HalConfig, HalStatus, NeighborAp,
    PairedSsidInfo, RadioTrafficStats, RoamingCtrl, SsidTrafficStats, StaStats,
};
use super::WifiHal;

/// Scratch buffer for `CHAR *output_string` arguments. The headers leave the
/// size to the caller; channel lists are the longest outputs in practice.
const OUTPUT_STRING_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum HalLoadError {
    #[error("failed to open HAL library {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("HAL library does not export {0}")]
    MissingSymbol(String),
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CHalConfig {
    wlan_interface: [c_char; 64],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CStaStats {
    ssid: [c_char; 64],
    bssid: [c_char; 64],
    band: [c_char; 16],
    sec_mode: [c_char; 64],
    encryption: [c_char; 64],
    phy_rate: f32,
    noise: f32,
    rssi: f32,
    frequency: c_int,
    last_data_downlink_rate: c_int,
    last_data_uplink_rate: c_int,
    retransmissions: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CRoamingCtrl {
    roaming_enable: c_int,
    self_steer_override: c_int,
    roam_80211kvr_enable: c_int,
    preassn_best_threshold: c_int,
    preassn_best_delta: c_int,
    post_assn_level_delta_connected: c_int,
    post_assn_level_delta_disconnected: c_int,
    post_assn_self_steer_threshold: c_int,
    post_assn_self_steer_timeframe: c_int,
    post_assn_back_off_time: c_int,
    post_assn_ap_ctrl_threshold: c_int,
    post_assn_ap_ctrl_timeframe: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CPairedSsidInfo {
    ssid: [c_char; 64],
    bssid: [c_char; 64],
    security: [c_char; 64],
    passphrase: [c_char; 128],
    wep_key: [c_char; 128],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CNeighborAp {
    ssid: [c_char; 64],
    bssid: [c_char; 64],
    mode: [c_char; 64],
    channel: c_uint,
    signal_strength: c_int,
    security_mode_enabled: [c_char; 64],
    encryption_mode: [c_char; 64],
    operating_frequency_band: [c_char; 16],
    supported_standards: [c_char; 64],
    operating_standards: [c_char; 16],
    operating_channel_bandwidth: [c_char; 16],
    beacon_period: c_uint,
    noise: c_int,
    basic_data_transfer_rates: [c_char; 256],
    supported_data_transfer_rates: [c_char; 256],
    dtim_period: c_uint,
    channel_utilization: c_uint,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CRadioTrafficStats {
    bytes_sent: c_ulong,
    bytes_received: c_ulong,
    packets_sent: c_ulong,
    packets_received: c_ulong,
    errors_sent: c_ulong,
    errors_received: c_ulong,
    discard_packets_sent: c_ulong,
    discard_packets_received: c_ulong,
    plcp_error_count: c_ulong,
    fcs_error_count: c_ulong,
    invalid_mac_count: c_ulong,
    packets_other_received: c_ulong,
    noise_floor: c_int,
    channel_utilization: c_ulong,
    activity_factor: c_int,
    carrier_sense_threshold_exceeded: c_int,
    retransmission_metric: c_int,
    maximum_noise_floor_on_channel: c_int,
    minimum_noise_floor_on_channel: c_int,
    median_noise_floor_on_channel: c_int,
    statistics_start_time: c_ulong,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CSsidTrafficStats {
    counters: [c_ulong; 21],
}

/// Types for which the all-zero bit pattern is a valid value
unsafe trait Plain: Copy {}

unsafe impl Plain for u8 {}
unsafe impl Plain for i32 {}
unsafe impl Plain for u32 {}
unsafe impl Plain for u64 {}
unsafe impl Plain for CStaStats {}
unsafe impl Plain for CRoamingCtrl {}
unsafe impl Plain for CPairedSsidInfo {}
unsafe impl Plain for CRadioTrafficStats {}
unsafe impl Plain for CSsidTrafficStats {}

type VoidFn = unsafe extern "C" fn() -> c_int;
type InitWithConfigFn = unsafe extern "C" fn(*mut CHalConfig) -> c_int;
type StringFn = unsafe extern "C" fn(*mut c_char) -> c_int;
type UlongFn = unsafe extern "C" fn(*mut c_ulong) -> c_int;
type IndexFn = unsafe extern "C" fn(c_int) -> c_int;
type IndexStringFn = unsafe extern "C" fn(c_int, *mut c_char) -> c_int;
type IndexBoolFn = unsafe extern "C" fn(c_int, *mut c_uchar) -> c_int;
type IndexUlongFn = unsafe extern "C" fn(c_int, *mut c_ulong) -> c_int;
type IndexIntFn = unsafe extern "C" fn(c_int, *mut c_int) -> c_int;
type StatsFn = unsafe extern "C" fn(c_int, *mut CStaStats) -> c_int;
type RadioStandardFn =
    unsafe extern "C" fn(c_int, *mut c_char, *mut c_uchar, *mut c_uchar, *mut c_uchar) -> c_int;
type RadioTrafficFn = unsafe extern "C" fn(c_int, *mut CRadioTrafficStats) -> c_int;
type SsidTrafficFn = unsafe extern "C" fn(c_int, *mut CSsidTrafficStats) -> c_int;
type NeighborFn = unsafe extern "C" fn(c_int, *mut *mut CNeighborAp, *mut c_uint) -> c_int;
type SpecificSsidFn =
    unsafe extern "C" fn(*const c_char, c_int, *mut *mut CNeighborAp, *mut c_uint) -> c_int;
type FreqListFn = unsafe extern "C" fn(c_int, *const c_char) -> c_int;
type DualBandFn = unsafe extern "C" fn() -> c_uchar;
type ConnectFn = unsafe extern "C" fn(
    c_int,
    *mut c_char,
    c_int,
    *mut c_char,
    *mut c_char,
    *mut c_char,
    c_int,
    *mut c_char,
    *mut c_char,
    *mut c_char,
    *mut c_char,
) -> c_int;
type DisconnectFn = unsafe extern "C" fn(c_int, *mut c_char) -> c_int;
type PairedFn = unsafe extern "C" fn(*mut CPairedSsidInfo) -> c_int;
type RoamingFn = unsafe extern "C" fn(c_int, *mut CRoamingCtrl) -> c_int;
type CEndpointCallback = unsafe extern "C" fn(c_int, *mut c_char, *mut c_int) -> c_int;
type RegisterFn = unsafe extern "C" fn(Option<CEndpointCallback>);

/// Resolved entry points
struct Entries {
    init: VoidFn,
    init_with_config: InitWithConfigFn,
    uninit: VoidFn,
    hal_version: StringFn,
    stats: StatsFn,
    radio_count: UlongFn,
    ssid_count: UlongFn,
    radio_bool: HashMap<RadioBoolParam, IndexBoolFn>,
    radio_string: HashMap<RadioStringParam, IndexStringFn>,
    radio_ulong: HashMap<RadioUlongParam, IndexUlongFn>,
    radio_int: HashMap<RadioIntParam, IndexIntFn>,
    radio_standard: RadioStandardFn,
    radio_traffic: RadioTrafficFn,
    ssid_string: HashMap<SsidStringParam, IndexStringFn>,
    ssid_traffic: SsidTrafficFn,
    neighbors: NeighborFn,
    specific_ssid: SpecificSsidFn,
    freq_list: FreqListFn,
    dual_band: DualBandFn,
    wait_for_scan: VoidFn,
    connect: ConnectFn,
    disconnect: DisconnectFn,
    clear_ssid: IndexFn,
    last_connected: PairedFn,
    set_roaming: RoamingFn,
    get_roaming: RoamingFn,
    wps_push: IndexFn,
    wps_cancel: VoidFn,
    connect_register: RegisterFn,
    disconnect_register: RegisterFn,
}

unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T, HalLoadError> {
    let symbol = library
        .get::<T>(name.as_bytes())
        .map_err(|_| HalLoadError::MissingSymbol(name.to_string()))?;
    Ok(*symbol)
}

unsafe fn symbol_map<P, T>(
    library: &Library,
    params: Vec<P>,
    name: fn(P) -> &'static str,
) -> Result<HashMap<P, T>, HalLoadError>
where
    P: Copy + Eq + std::hash::Hash,
    T: Copy,
{
    let mut map = HashMap::new();
    for param in params {
        map.insert(param, symbol(library, name(param))?);
    }
    Ok(map)
}

impl Entries {
    /// # Safety
    ///
    /// The library must export each symbol with the C signature the HAL
    /// headers declare.
    unsafe fn resolve(library: &Library) -> Result<Self, HalLoadError> {
        Ok(Self {
            init: symbol(library, api::WIFI_INIT)?,
            init_with_config: symbol(library, api::WIFI_INIT_WITH_CONFIG)?,
            uninit: symbol(library, api::WIFI_UNINIT)?,
            hal_version: symbol(library, api::GET_HAL_VERSION)?,
            stats: symbol(library, api::GET_STATS)?,
            radio_count: symbol(library, api::GET_RADIO_NUMBER_OF_ENTRIES)?,
            ssid_count: symbol(library, api::GET_SSID_NUMBER_OF_ENTRIES)?,
            radio_bool: symbol_map(library, RadioBoolParam::all(), RadioBoolParam::api)?,
            radio_string: symbol_map(library, RadioStringParam::all(), RadioStringParam::api)?,
            radio_ulong: symbol_map(library, RadioUlongParam::all(), RadioUlongParam::api)?,
            radio_int: symbol_map(library, RadioIntParam::all(), RadioIntParam::api)?,
            radio_standard: symbol(library, api::GET_RADIO_STANDARD)?,
            radio_traffic: symbol(library, api::GET_RADIO_TRAFFIC_STATS)?,
            ssid_string: symbol_map(library, SsidStringParam::all(), SsidStringParam::api)?,
            ssid_traffic: symbol(library, api::GET_SSID_TRAFFIC_STATS)?,
            neighbors: symbol(library, api::GET_NEIGHBORING_DIAGNOSTIC)?,
            specific_ssid: symbol(library, api::GET_SPECIFIC_SSID_INFO)?,
            freq_list: symbol(library, api::SET_SCANNING_FREQ_LIST)?,
            dual_band: symbol(library, api::GET_DUAL_BAND_SUPPORT)?,
            wait_for_scan: symbol(library, api::WAIT_FOR_SCAN_RESULTS)?,
            connect: symbol(library, api::CONNECT_ENDPOINT)?,
            disconnect: symbol(library, api::DISCONNECT_ENDPOINT)?,
            clear_ssid: symbol(library, api::CLEAR_SSID_INFO)?,
            last_connected: symbol(library, api::LAST_CONNECTED_ENDPOINT)?,
            set_roaming: symbol(library, api::SET_ROAMING_CONTROL)?,
            get_roaming: symbol(library, api::GET_ROAMING_CONTROL)?,
            wps_push: symbol(library, api::SET_WPS_BUTTON_PUSH)?,
            wps_cancel: symbol(library, api::CANCEL_WPS_PAIRING)?,
            connect_register: symbol(library, api::CONNECT_CALLBACK_REGISTER)?,
            disconnect_register: symbol(library, api::DISCONNECT_CALLBACK_REGISTER)?,
        })
    }
}

/// HAL backed by a vendor shared library
pub struct VendorHal {
    path: PathBuf,
    entries: Entries,
    _library: Library,
}

impl VendorHal {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HalLoadError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initializers; the vendor HAL is
        // the code under test and is trusted to that extent.
        let library = unsafe { Library::new(path) }.map_err(|source| HalLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = unsafe { Entries::resolve(&library)? };
        info!("Loaded vendor HAL from {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn status(api: &str, code: c_int) -> HalStatus {
    debug!("{} -> {}", api, code);
    match code {
        HalStatus::RETURN_OK => HalStatus::Ok,
        HalStatus::RETURN_ERR => HalStatus::Err,
        other => {
            warn!("{} returned unexpected code {}", api, other);
            HalStatus::Err
        }
    }
}

fn from_c_buf(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn to_c_buf<const N: usize>(value: &str) -> [c_char; N] {
    let mut buf = [0 as c_char; N];
    for (slot, byte) in buf.iter_mut().zip(value.bytes().take(N - 1)) {
        *slot = byte as c_char;
    }
    buf
}

/// `None` stays `None`; a string with an interior NUL cannot be passed
fn c_string(api: &str, value: Option<&str>) -> Result<Option<CString>, HalStatus> {
    value
        .map(|v| {
            CString::new(v).map_err(|_| {
                warn!("{}: argument contains NUL byte", api);
                HalStatus::Err
            })
        })
        .transpose()
}

fn c_ptr(value: &Option<CString>) -> *mut c_char {
    value.as_ref().map_or(ptr::null_mut(), |v| v.as_ptr().cast_mut())
}

/// Call an entry point with one plain output argument
fn call_out<C: Plain, T>(
    api: &str,
    output: Option<&mut T>,
    call: impl FnOnce(*mut C) -> c_int,
    convert: impl FnOnce(&C) -> T,
) -> HalStatus {
    // SAFETY: `Plain` types are valid when zeroed.
    let mut raw: C = unsafe { std::mem::zeroed() };
    let out_ptr = if output.is_some() {
        &mut raw as *mut C
    } else {
        ptr::null_mut()
    };
    let result = status(api, call(out_ptr));
    if let (HalStatus::Ok, Some(output)) = (result, output) {
        *output = convert(&raw);
    }
    result
}

fn call_string(
    api: &str,
    output: Option<&mut String>,
    call: impl FnOnce(*mut c_char) -> c_int,
) -> HalStatus {
    let mut buf = vec![0 as c_char; OUTPUT_STRING_LEN];
    let out_ptr = if output.is_some() {
        buf.as_mut_ptr()
    } else {
        ptr::null_mut()
    };
    let result = status(api, call(out_ptr));
    if let (HalStatus::Ok, Some(output)) = (result, output) {
        *output = from_c_buf(&buf);
    }
    result
}

/// Copy a HAL-allocated neighbor array and release it
fn take_neighbors(array: *mut CNeighborAp, count: c_uint) -> Vec<NeighborAp> {
    if array.is_null() {
        return Vec::new();
    }
    // SAFETY: the HAL returns `count` contiguous entries allocated with malloc.
    let list = unsafe { std::slice::from_raw_parts(array, count as usize) }
        .iter()
        .map(NeighborAp::from)
        .collect();
    unsafe { libc::free(array.cast()) };
    list
}

fn call_neighbors(
    api: &str,
    aps: Option<&mut Vec<NeighborAp>>,
    count: Option<&mut u32>,
    call: impl FnOnce(*mut *mut CNeighborAp, *mut c_uint) -> c_int,
) -> HalStatus {
    let mut array: *mut CNeighborAp = ptr::null_mut();
    let mut size: c_uint = 0;
    let array_ptr = if aps.is_some() {
        &mut array as *mut *mut CNeighborAp
    } else {
        ptr::null_mut()
    };
    let size_ptr = if count.is_some() {
        &mut size as *mut c_uint
    } else {
        ptr::null_mut()
    };

    let result = status(api, call(array_ptr, size_ptr));
    let list = take_neighbors(array, size);
    if result == HalStatus::Ok {
        if let Some(aps) = aps {
            *aps = list;
        }
        if let Some(count) = count {
            *count = size;
        }
    }
    result
}

impl From<&CNeighborAp> for NeighborAp {
    fn from(ap: &CNeighborAp) -> Self {
        Self {
            ssid: from_c_buf(&ap.ssid),
            bssid: from_c_buf(&ap.bssid),
            mode: from_c_buf(&ap.mode),
            channel: ap.channel,
            signal_strength: ap.signal_strength,
            security_mode_enabled: from_c_buf(&ap.security_mode_enabled),
            encryption_mode: from_c_buf(&ap.encryption_mode),
            operating_frequency_band: from_c_buf(&ap.operating_frequency_band),
            supported_standards: from_c_buf(&ap.supported_standards),
            operating_standards: from_c_buf(&ap.operating_standards),
            operating_channel_bandwidth: from_c_buf(&ap.operating_channel_bandwidth),
            beacon_period: ap.beacon_period,
            noise: ap.noise,
            basic_data_transfer_rates: from_c_buf(&ap.basic_data_transfer_rates),
            supported_data_transfer_rates: from_c_buf(&ap.supported_data_transfer_rates),
            dtim_period: ap.dtim_period,
            channel_utilization: ap.channel_utilization,
        }
    }
}

impl From<&CStaStats> for StaStats {
    fn from(stats: &CStaStats) -> Self {
        Self {
            ssid: from_c_buf(&stats.ssid),
            bssid: from_c_buf(&stats.bssid),
            band: from_c_buf(&stats.band),
            sec_mode: from_c_buf(&stats.sec_mode),
            encryption: from_c_buf(&stats.encryption),
            phy_rate: stats.phy_rate,
            noise: stats.noise,
            rssi: stats.rssi,
            frequency: stats.frequency,
            last_data_downlink_rate: stats.last_data_downlink_rate,
            last_data_uplink_rate: stats.last_data_uplink_rate,
            retransmissions: stats.retransmissions,
        }
    }
}

impl From<&CPairedSsidInfo> for PairedSsidInfo {
    fn from(info: &CPairedSsidInfo) -> Self {
        Self {
            ssid: from_c_buf(&info.ssid),
            bssid: from_c_buf(&info.bssid),
            security: from_c_buf(&info.security),
            passphrase: from_c_buf(&info.passphrase),
            wep_key: from_c_buf(&info.wep_key),
        }
    }
}

impl From<&CRoamingCtrl> for RoamingCtrl {
    fn from(c: &CRoamingCtrl) -> Self {
        Self {
            roaming_enable: c.roaming_enable,
            self_steer_override: c.self_steer_override,
            roam_80211kvr_enable: c.roam_80211kvr_enable,
            preassn_best_threshold: c.preassn_best_threshold,
            preassn_best_delta: c.preassn_best_delta,
            post_assn_level_delta_connected: c.post_assn_level_delta_connected,
            post_assn_level_delta_disconnected: c.post_assn_level_delta_disconnected,
            post_assn_self_steer_threshold: c.post_assn_self_steer_threshold,
            post_assn_self_steer_timeframe: c.post_assn_self_steer_timeframe,
            post_assn_back_off_time: c.post_assn_back_off_time,
            post_assn_ap_ctrl_threshold: c.post_assn_ap_ctrl_threshold,
            post_assn_ap_ctrl_timeframe: c.post_assn_ap_ctrl_timeframe,
        }
    }
}

impl From<&RoamingCtrl> for CRoamingCtrl {
    fn from(r: &RoamingCtrl) -> Self {
        Self {
            roaming_enable: r.roaming_enable,
            self_steer_override: r.self_steer_override,
            roam_80211kvr_enable: r.roam_80211kvr_enable,
            preassn_best_threshold: r.preassn_best_threshold,
            preassn_best_delta: r.preassn_best_delta,
            post_assn_level_delta_connected: r.post_assn_level_delta_connected,
            post_assn_level_delta_disconnected: r.post_assn_level_delta_disconnected,
            post_assn_self_steer_threshold: r.post_assn_self_steer_threshold,
            post_assn_self_steer_timeframe: r.post_assn_self_steer_timeframe,
            post_assn_back_off_time: r.post_assn_back_off_time,
            post_assn_ap_ctrl_threshold: r.post_assn_ap_ctrl_threshold,
            post_assn_ap_ctrl_timeframe: r.post_assn_ap_ctrl_timeframe,
        }
    }
}

impl From<&CRadioTrafficStats> for RadioTrafficStats {
    fn from(s: &CRadioTrafficStats) -> Self {
        Self {
            bytes_sent: s.bytes_sent as u64,
            bytes_received: s.bytes_received as u64,
            packets_sent: s.packets_sent as u64,
            packets_received: s.packets_received as u64,
            errors_sent: s.errors_sent as u64,
            errors_received: s.errors_received as u64,
            discard_packets_sent: s.discard_packets_sent as u64,
            discard_packets_received: s.discard_packets_received as u64,
            plcp_error_count: s.plcp_error_count as u64,
            fcs_error_count: s.fcs_error_count as u64,
            invalid_mac_count: s.invalid_mac_count as u64,
            packets_other_received: s.packets_other_received as u64,
            noise_floor: s.noise_floor,
            channel_utilization: s.channel_utilization as u64,
            activity_factor: s.activity_factor,
            carrier_sense_threshold_exceeded: s.carrier_sense_threshold_exceeded,
            retransmission_metric: s.retransmission_metric,
            maximum_noise_floor_on_channel: s.maximum_noise_floor_on_channel,
            minimum_noise_floor_on_channel: s.minimum_noise_floor_on_channel,
            median_noise_floor_on_channel: s.median_noise_floor_on_channel,
            statistics_start_time: s.statistics_start_time as u64,
        }
    }
}

impl From<&CSsidTrafficStats> for SsidTrafficStats {
    fn from(s: &CSsidTrafficStats) -> Self {
        let c = s.counters.map(|v| v as u64);
        Self {
            bytes_sent: c[0],
            bytes_received: c[1],
            packets_sent: c[2],
            packets_received: c[3],
            retrans_count: c[4],
            failed_retrans_count: c[5],
            retry_count: c[6],
            multiple_retry_count: c[7],
            ack_failure_count: c[8],
            aggregated_packet_count: c[9],
            errors_sent: c[10],
            errors_received: c[11],
            unicast_packets_sent: c[12],
            unicast_packets_received: c[13],
            discarded_packets_sent: c[14],
            discarded_packets_received: c[15],
            multicast_packets_sent: c[16],
            multicast_packets_received: c[17],
            broadcast_packets_sent: c[18],
            broadcast_packets_received: c[19],
            unknown_packets_received: c[20],
        }
    }
}

// Callbacks

static CONNECT_CALLBACK: OnceLock<Mutex<Option<EndpointCallback>>> = OnceLock::new();
static DISCONNECT_CALLBACK: OnceLock<Mutex<Option<EndpointCallback>>> = OnceLock::new();

fn callback_slot(cell: &'static OnceLock<Mutex<Option<EndpointCallback>>>) -> &'static Mutex<Option<EndpointCallback>> {
    cell.get_or_init(|| Mutex::new(None))
}

fn store_callback(
    cell: &'static OnceLock<Mutex<Option<EndpointCallback>>>,
    callback: Option<EndpointCallback>,
) {
    let mut slot = callback_slot(cell)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = callback;
}

fn forward(
    cell: &'static OnceLock<Mutex<Option<EndpointCallback>>>,
    ssid_index: c_int,
    ssid: *mut c_char,
    code: *mut c_int,
) {
    let callback = callback_slot(cell)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    let Some(callback) = callback else {
        return;
    };

    let ssid = if ssid.is_null() {
        String::new()
    } else {
        // SAFETY: the HAL passes a NUL-terminated SSID.
        unsafe { CStr::from_ptr(ssid) }.to_string_lossy().into_owned()
    };
    let status = if code.is_null() {
        ConnectStatus::ErrorUnknown
    } else {
        ConnectStatus::from_raw(unsafe { *code })
    };

    // Unwinding into the HAL's thread is not allowed.
    if panic::catch_unwind(AssertUnwindSafe(|| callback(ssid_index, &ssid, status))).is_err() {
        warn!("endpoint callback panicked");
    }
}

unsafe extern "C" fn connect_trampoline(ssid_index: c_int, ssid: *mut c_char, code: *mut c_int) -> c_int {
    forward(&CONNECT_CALLBACK, ssid_index, ssid, code);
    HalStatus::RETURN_OK
}

unsafe extern "C" fn disconnect_trampoline(
    ssid_index: c_int,
    ssid: *mut c_char,
    code: *mut c_int,
) -> c_int {
    forward(&DISCONNECT_CALLBACK, ssid_index, ssid, code);
    HalStatus::RETURN_OK
}

impl WifiHal for VendorHal {
    fn backend(&self) -> &str {
        "vendor"
    }

    fn init(&mut self) -> HalStatus {
        status(api::WIFI_INIT, unsafe { (self.entries.init)() })
    }

    fn init_with_config(&mut self, config: Option<&HalConfig>) -> HalStatus {
        let mut raw = config.map(|c| CHalConfig {
            wlan_interface: to_c_buf(&c.wlan_interface),
        });
        let config_ptr = raw.as_mut().map_or(ptr::null_mut(), |c| c as *mut CHalConfig);
        status(api::WIFI_INIT_WITH_CONFIG, unsafe {
            (self.entries.init_with_config)(config_ptr)
        })
    }

    fn uninit(&mut self) -> HalStatus {
        status(api::WIFI_UNINIT, unsafe { (self.entries.uninit)() })
    }

    fn get_hal_version(&mut self, output: Option<&mut String>) -> HalStatus {
        let f = self.entries.hal_version;
        call_string(api::GET_HAL_VERSION, output, |out| unsafe { f(out) })
    }

    fn get_stats(&mut self, radio_index: i32, output: Option<&mut StaStats>) -> HalStatus {
        let f = self.entries.stats;
        call_out(
            api::GET_STATS,
            output,
            |out| unsafe { f(radio_index, out) },
            |raw| StaStats::from(raw),
        )
    }

    fn get_radio_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus {
        let f = self.entries.radio_count;
        call_out(
            api::GET_RADIO_NUMBER_OF_ENTRIES,
            output,
            |out| unsafe { f(out) },
            |v: &c_ulong| *v as u64,
        )
    }

    fn get_ssid_number_of_entries(&mut self, output: Option<&mut u64>) -> HalStatus {
        let f = self.entries.ssid_count;
        call_out(
            api::GET_SSID_NUMBER_OF_ENTRIES,
            output,
            |out| unsafe { f(out) },
            |v: &c_ulong| *v as u64,
        )
    }

    fn get_radio_bool(
        &mut self,
        param: RadioBoolParam,
        radio_index: i32,
        output: Option<&mut bool>,
    ) -> HalStatus {
        let Some(&f) = self.entries.radio_bool.get(&param) else {
            return HalStatus::Err;
        };
        call_out(
            param.api(),
            output,
            |out| unsafe { f(radio_index, out) },
            |v: &c_uchar| *v != 0,
        )
    }

    fn get_radio_string(
        &mut self,
        param: RadioStringParam,
        radio_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus {
        let Some(&f) = self.entries.radio_string.get(&param) else {
            return HalStatus::Err;
        };
        call_string(param.api(), output, |out| unsafe { f(radio_index, out) })
    }

    fn get_radio_ulong(
        &mut self,
        param: RadioUlongParam,
        radio_index: i32,
        output: Option<&mut u64>,
    ) -> HalStatus {
        let Some(&f) = self.entries.radio_ulong.get(&param) else {
            return HalStatus::Err;
        };
        call_out(
            param.api(),
            output,
            |out| unsafe { f(radio_index, out) },
            |v: &c_ulong| *v as u64,
        )
    }

    fn get_radio_int(
        &mut self,
        param: RadioIntParam,
        radio_index: i32,
        output: Option<&mut i32>,
    ) -> HalStatus {
        let Some(&f) = self.entries.radio_int.get(&param) else {
            return HalStatus::Err;
        };
        call_out(
            param.api(),
            output,
            |out| unsafe { f(radio_index, out) },
            |v: &c_int| *v,
        )
    }

    fn get_radio_standard(
        &mut self,
        radio_index: i32,
        output: Option<&mut String>,
        g_only: Option<&mut bool>,
        n_only: Option<&mut bool>,
        ac_only: Option<&mut bool>,
    ) -> HalStatus {
        let f = self.entries.radio_standard;
        let mut flags: [c_uchar; 3] = [0; 3];
        let [g_ptr, n_ptr, ac_ptr] = {
            let [g, n, ac] = &mut flags;
            [
                g_only.as_ref().map_or(ptr::null_mut(), |_| g as *mut c_uchar),
                n_only.as_ref().map_or(ptr::null_mut(), |_| n as *mut c_uchar),
                ac_only.as_ref().map_or(ptr::null_mut(), |_| ac as *mut c_uchar),
            ]
        };
        let result = call_string(api::GET_RADIO_STANDARD, output, |out| unsafe {
            f(radio_index, out, g_ptr, n_ptr, ac_ptr)
        });
        if result == HalStatus::Ok {
            for (slot, value) in [g_only, n_only, ac_only].into_iter().zip(flags) {
                if let Some(slot) = slot {
                    *slot = value != 0;
                }
            }
        }
        result
    }

    fn get_radio_traffic_stats(
        &mut self,
        radio_index: i32,
        output: Option<&mut RadioTrafficStats>,
    ) -> HalStatus {
        let f = self.entries.radio_traffic;
        call_out(
            api::GET_RADIO_TRAFFIC_STATS,
            output,
            |out| unsafe { f(radio_index, out) },
            |raw| RadioTrafficStats::from(raw),
        )
    }

    fn get_ssid_string(
        &mut self,
        param: SsidStringParam,
        ssid_index: i32,
        output: Option<&mut String>,
    ) -> HalStatus {
        let Some(&f) = self.entries.ssid_string.get(&param) else {
            return HalStatus::Err;
        };
        call_string(param.api(), output, |out| unsafe { f(ssid_index, out) })
    }

    fn get_ssid_traffic_stats(
        &mut self,
        ssid_index: i32,
        output: Option<&mut SsidTrafficStats>,
    ) -> HalStatus {
        let f = self.entries.ssid_traffic;
        call_out(
            api::GET_SSID_TRAFFIC_STATS,
            output,
            |out| unsafe { f(ssid_index, out) },
            |raw| SsidTrafficStats::from(raw),
        )
    }

    fn get_neighboring_wifi_diagnostic_result(
        &mut self,
        radio_index: i32,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus {
        let f = self.entries.neighbors;
        call_neighbors(api::GET_NEIGHBORING_DIAGNOSTIC, aps, count, |array, size| unsafe {
            f(radio_index, array, size)
        })
    }

    fn get_specific_ssid_info(
        &mut self,
        ssid: Option<&str>,
        band: FreqBand,
        aps: Option<&mut Vec<NeighborAp>>,
        count: Option<&mut u32>,
    ) -> HalStatus {
        let ssid = match c_string(api::GET_SPECIFIC_SSID_INFO, ssid) {
            Ok(ssid) => ssid,
            Err(status) => return status,
        };
        let f = self.entries.specific_ssid;
        let ssid_ptr = c_ptr(&ssid).cast_const();
        call_neighbors(api::GET_SPECIFIC_SSID_INFO, aps, count, |array, size| unsafe {
            f(ssid_ptr, band.to_raw(), array, size)
        })
    }

    fn set_radio_scanning_freq_list(
        &mut self,
        radio_index: i32,
        freq_list: Option<&str>,
    ) -> HalStatus {
        let list = match c_string(api::SET_SCANNING_FREQ_LIST, freq_list) {
            Ok(list) => list,
            Err(status) => return status,
        };
        status(api::SET_SCANNING_FREQ_LIST, unsafe {
            (self.entries.freq_list)(radio_index, c_ptr(&list).cast_const())
        })
    }

    fn get_dual_band_support(&mut self) -> bool {
        let supported = unsafe { (self.entries.dual_band)() } != 0;
        debug!("{} -> {}", api::GET_DUAL_BAND_SUPPORT, supported);
        supported
    }

    fn wait_for_scan_results(&mut self) -> HalStatus {
        status(api::WAIT_FOR_SCAN_RESULTS, unsafe {
            (self.entries.wait_for_scan)()
        })
    }

    fn connect_endpoint(&mut self, ssid_index: i32, request: &ConnectRequest) -> HalStatus {
        let name = api::CONNECT_ENDPOINT;
        let strings = [
            &request.ssid,
            &request.wep_key,
            &request.pre_shared_key,
            &request.key_passphrase,
            &request.eap_identity,
            &request.ca_root_cert,
            &request.client_cert,
            &request.private_key,
        ]
        .into_iter()
        .map(|s| c_string(name, s.as_deref()))
        .collect::<Result<Vec<_>, _>>();
        let strings = match strings {
            Ok(strings) => strings,
            Err(status) => return status,
        };
        let p = |i: usize| c_ptr(&strings[i]);

        status(name, unsafe {
            (self.entries.connect)(
                ssid_index,
                p(0),
                request.security_mode.to_raw(),
                p(1),
                p(2),
                p(3),
                request.save_ssid,
                p(4),
                p(5),
                p(6),
                p(7),
            )
        })
    }

    fn disconnect_endpoint(&mut self, ssid_index: i32, ssid: Option<&str>) -> HalStatus {
        let ssid = match c_string(api::DISCONNECT_ENDPOINT, ssid) {
            Ok(ssid) => ssid,
            Err(status) => return status,
        };
        status(api::DISCONNECT_ENDPOINT, unsafe {
            (self.entries.disconnect)(ssid_index, c_ptr(&ssid))
        })
    }

    fn clear_ssid_info(&mut self, ssid_index: i32) -> HalStatus {
        status(api::CLEAR_SSID_INFO, unsafe {
            (self.entries.clear_ssid)(ssid_index)
        })
    }

    fn last_connected_endpoint(&mut self, output: Option<&mut PairedSsidInfo>) -> HalStatus {
        let f = self.entries.last_connected;
        call_out(
            api::LAST_CONNECTED_ENDPOINT,
            output,
            |out| unsafe { f(out) },
            |raw| PairedSsidInfo::from(raw),
        )
    }

    fn set_roaming_control(&mut self, ssid_index: i32, ctrl: Option<&RoamingCtrl>) -> HalStatus {
        let mut raw = ctrl.map(CRoamingCtrl::from);
        let ctrl_ptr = raw.as_mut().map_or(ptr::null_mut(), |c| c as *mut CRoamingCtrl);
        status(api::SET_ROAMING_CONTROL, unsafe {
            (self.entries.set_roaming)(ssid_index, ctrl_ptr)
        })
    }

    fn get_roaming_control(
        &mut self,
        ssid_index: i32,
        output: Option<&mut RoamingCtrl>,
    ) -> HalStatus {
        let f = self.entries.get_roaming;
        call_out(
            api::GET_ROAMING_CONTROL,
            output,
            |out| unsafe { f(ssid_index, out) },
            |raw| RoamingCtrl::from(raw),
        )
    }

    fn set_cli_wps_button_push(&mut self, ssid_index: i32) -> HalStatus {
        status(api::SET_WPS_BUTTON_PUSH, unsafe {
            (self.entries.wps_push)(ssid_index)
        })
    }

    fn cancel_wps_pairing(&mut self) -> HalStatus {
        status(api::CANCEL_WPS_PAIRING, unsafe {
            (self.entries.wps_cancel)()
        })
    }

    fn register_connect_callback(&mut self, callback: Option<EndpointCallback>) {
        let trampoline = callback.is_some().then_some(connect_trampoline as CEndpointCallback);
        store_callback(&CONNECT_CALLBACK, callback);
        unsafe { (self.entries.connect_register)(trampoline) };
    }

    fn register_disconnect_callback(&mut self, callback: Option<EndpointCallback>) {
        let trampoline = callback
            .is_some()
            .then_some(disconnect_trampoline as CEndpointCallback);
        store_callback(&DISCONNECT_CALLBACK, callback);
        unsafe { (self.entries.disconnect_register)(trampoline) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_load_missing_library() {
        let result = VendorHal::load("/nonexistent/libwifihal.so");
        assert!(matches!(result, Err(HalLoadError::Open { .. })));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status("wifi_init", 0), HalStatus::Ok);
        assert_eq!(status("wifi_init", -1), HalStatus::Err);
        assert_eq!(status("wifi_init", 3), HalStatus::Err);
    }

    #[test]
    fn test_c_buffer_round_trip() {
        let buf: [c_char; 16] = to_c_buf("wlan0");
        assert_eq!(from_c_buf(&buf), "wlan0");

        let truncated: [c_char; 4] = to_c_buf("wlan0");
        assert_eq!(from_c_buf(&truncated), "wla");
    }

    #[test]
    fn test_c_string_rejects_nul() {
        assert!(c_string("x", Some("a\0b")).is_err());
        assert!(matches!(c_string("x", None), Ok(None)));
        assert!(c_ptr(&None).is_null());
    }

    #[test]
    fn test_call_out_null_output() {
        let mut seen_null = false;
        let result = call_out::<c_int, i32>(
            "wifi_getRadioMCS",
            None,
            |out| {
                seen_null = out.is_null();
                HalStatus::RETURN_ERR
            },
            |v| *v,
        );
        assert!(seen_null);
        assert_eq!(result, HalStatus::Err);
    }

    #[test]
    fn test_call_out_copies_value() {
        let mut value = 0;
        let result = call_out::<c_int, i32>(
            "wifi_getRadioMCS",
            Some(&mut value),
            |out| {
                unsafe { *out = 9 };
                HalStatus::RETURN_OK
            },
            |v| *v,
        );
        assert_eq!(result, HalStatus::Ok);
        assert_eq!(value, 9);
    }

    #[test]
    fn test_call_out_converts_struct() {
        let mut stats = StaStats::default();
        let result = call_out::<CStaStats, StaStats>(
            api::GET_STATS,
            Some(&mut stats),
            |out| {
                let raw = unsafe { &mut *out };
                raw.ssid = to_c_buf("home");
                raw.rssi = -42.0;
                raw.frequency = 2437;
                HalStatus::RETURN_OK
            },
            |raw| StaStats::from(raw),
        );

        assert_eq!(result, HalStatus::Ok);
        assert_eq!(stats.ssid, "home");
        assert_eq!(stats.rssi, -42.0);
        assert_eq!(stats.frequency, 2437);
    }

    #[test]
    fn test_trampoline_forwards_event() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store_callback(
            &DISCONNECT_CALLBACK,
            Some(Arc::new(move |index: i32, ssid: &str, status: ConnectStatus| {
                sink.lock().unwrap().push((index, ssid.to_string(), status));
            })),
        );

        let ssid = CString::new("home").unwrap();
        let mut code = ConnectStatus::Disconnected.to_raw();
        let rc = unsafe { disconnect_trampoline(1, ssid.as_ptr().cast_mut(), &mut code) };
        store_callback(&DISCONNECT_CALLBACK, None);

        assert_eq!(rc, HalStatus::RETURN_OK);
        assert_eq!(
            events.lock().unwrap()[0],
            (1, "home".to_string(), ConnectStatus::Disconnected)
        );
    }
}
