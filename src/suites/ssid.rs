//! SSID getters, neighbor scans, scan frequency list

use super::{invalid_index_case, null_arg_case, validate, ApiProbe, IndexKind, IndexedGetter};
use crate::executor::{expect, expect_format, expect_one_of, expect_status, fixture, TestFailure};
use crate::hal::api::{
    GET_NEIGHBORING_DIAGNOSTIC, GET_SPECIFIC_SSID_INFO, GET_SSID_TRAFFIC_STATS,
    SET_SCANNING_FREQ_LIST, WAIT_FOR_SCAN_RESULTS,
};
use crate::hal::{FreqBand, HalStatus, NeighborAp, SsidStringParam, SsidTrafficStats};
use crate::models::TestCase;
use crate::utils::Timer;

const PROBE_SSID: &str = "l1-probe";
const PROBE_FREQ_LIST: &str = "2412";

fn string_getter(param: SsidStringParam) -> IndexedGetter {
    IndexedGetter::new(param.api(), IndexKind::Ssid, move |ctx, index, with_output| {
        let mut value = String::new();
        ctx.hal().get_ssid_string(param, index, with_output.then_some(&mut value))
    })
}

fn traffic_getter() -> IndexedGetter {
    IndexedGetter::new(GET_SSID_TRAFFIC_STATS, IndexKind::Ssid, |ctx, index, with_output| {
        let mut stats = SsidTrafficStats::default();
        ctx.hal().get_ssid_traffic_stats(index, with_output.then_some(&mut stats))
    })
}

fn getters() -> Vec<IndexedGetter> {
    let mut getters: Vec<IndexedGetter> = SsidStringParam::all().into_iter().map(string_getter).collect();
    getters.push(traffic_getter());
    getters
}

pub(crate) fn probes() -> Vec<ApiProbe> {
    let mut probes: Vec<ApiProbe> = getters().iter().map(IndexedGetter::probe).collect();
    probes.extend([
        ApiProbe::new(GET_NEIGHBORING_DIAGNOSTIC, |ctx| {
            let radio = ctx.radio_index();
            let (mut aps, mut count) = (Vec::new(), 0);
            ctx.hal()
                .get_neighboring_wifi_diagnostic_result(radio, Some(&mut aps), Some(&mut count))
        }),
        ApiProbe::new(GET_SPECIFIC_SSID_INFO, |ctx| {
            let (mut aps, mut count) = (Vec::new(), 0);
            ctx.hal().get_specific_ssid_info(
                Some(PROBE_SSID),
                FreqBand::None,
                Some(&mut aps),
                Some(&mut count),
            )
        }),
        ApiProbe::new(SET_SCANNING_FREQ_LIST, |ctx| {
            let radio = ctx.radio_index();
            ctx.hal().set_radio_scanning_freq_list(radio, Some(PROBE_FREQ_LIST))
        }),
        ApiProbe::new(WAIT_FOR_SCAN_RESULTS, |ctx| ctx.hal().wait_for_scan_results()),
    ]);
    probes
}

/// Every field of a scanned AP is in its allow-list
fn check_neighbor(api: &str, ap: &NeighborAp) -> Result<(), TestFailure> {
    expect_format(api, "ap_BSSID", &ap.bssid, validate::is_mac_address, "a MAC address")?;
    expect_format(api, "ap_SSID", &ap.ssid, validate::is_ssid, "an SSID")?;
    expect_one_of(api, "ap_Mode", &ap.mode, validate::NEIGHBOR_MODES)?;
    expect_one_of(api, "ap_SecurityModeEnabled", &ap.security_mode_enabled, validate::SECURITY_MODES)?;
    expect_one_of(api, "ap_EncryptionMode", &ap.encryption_mode, validate::ENCRYPTION_MODES)?;
    expect_one_of(
        api,
        "ap_OperatingFrequencyBand",
        &ap.operating_frequency_band,
        validate::FREQUENCY_BANDS,
    )?;
    expect(
        (1..=233).contains(&ap.channel),
        format!("{api}: ap_Channel {} is outside 1..=233", ap.channel),
    )
}

fn check_scan(api: &str, aps: &[NeighborAp], count: u32) -> Result<(), TestFailure> {
    expect(
        aps.len() == count as usize,
        format!("{api}: output_array_size {count} but {} entries returned", aps.len()),
    )?;
    aps.iter().try_for_each(|ap| check_neighbor(api, ap))
}

fn ssid_string_positive(param: SsidStringParam) -> TestCase {
    let api = param.api();
    TestCase::positive(format!("{api}_positive"), api, "reports a well-formed value", move |ctx| {
        let index = ctx.ssid_index();
        let mut value = String::new();
        expect_status(api, ctx.hal().get_ssid_string(param, index, Some(&mut value)), HalStatus::Ok)?;
        match param {
            SsidStringParam::Name => expect_format(api, "ssid", &value, validate::is_ssid, "an SSID"),
            SsidStringParam::MacAddress => {
                expect_format(api, "mac", &value, validate::is_mac_address, "a MAC address")
            }
        }
    })
}

fn traffic_positive() -> TestCase {
    TestCase::positive(
        "wifi_getSSIDTrafficStats_positive",
        GET_SSID_TRAFFIC_STATS,
        "unicast counters do not exceed totals",
        |ctx| {
            let index = ctx.ssid_index();
            let mut stats = SsidTrafficStats::default();
            expect_status(
                GET_SSID_TRAFFIC_STATS,
                ctx.hal().get_ssid_traffic_stats(index, Some(&mut stats)),
                HalStatus::Ok,
            )?;
            expect(
                stats.unicast_packets_sent <= stats.packets_sent,
                format!(
                    "{GET_SSID_TRAFFIC_STATS}: {} unicast of {} packets sent",
                    stats.unicast_packets_sent, stats.packets_sent
                ),
            )
        },
    )
}

fn neighboring_positive() -> TestCase {
    TestCase::positive(
        "wifi_getNeighboringWiFiDiagnosticResult_positive",
        GET_NEIGHBORING_DIAGNOSTIC,
        "scan results are well-formed",
        |ctx| {
            let radio = ctx.radio_index();
            let (mut aps, mut count) = (Vec::new(), 0);
            expect_status(
                GET_NEIGHBORING_DIAGNOSTIC,
                ctx.hal()
                    .get_neighboring_wifi_diagnostic_result(radio, Some(&mut aps), Some(&mut count)),
                HalStatus::Ok,
            )?;
            check_scan(GET_NEIGHBORING_DIAGNOSTIC, &aps, count)
        },
    )
}

fn neighboring_negatives() -> Vec<TestCase> {
    vec![
        invalid_index_case(GET_NEIGHBORING_DIAGNOSTIC, |ctx, index| {
            let (mut aps, mut count) = (Vec::new(), 0);
            ctx.hal()
                .get_neighboring_wifi_diagnostic_result(index, Some(&mut aps), Some(&mut count))
        }),
        null_arg_case(GET_NEIGHBORING_DIAGNOSTIC, "output", |ctx| {
            let radio = ctx.radio_index();
            let mut count = 0;
            ctx.hal()
                .get_neighboring_wifi_diagnostic_result(radio, None, Some(&mut count))
        }),
        null_arg_case(GET_NEIGHBORING_DIAGNOSTIC, "count", |ctx| {
            let radio = ctx.radio_index();
            let mut aps = Vec::new();
            ctx.hal()
                .get_neighboring_wifi_diagnostic_result(radio, Some(&mut aps), None)
        }),
    ]
}

fn specific_ssid_positive() -> TestCase {
    TestCase::positive(
        "wifi_getSpecificSSIDInfo_positive",
        GET_SPECIFIC_SSID_INFO,
        "finds the fixture AP on the fixture band",
        |ctx| {
            let ssid = fixture("scan.specific_ssid", ctx.fixtures().scan.specific_ssid.clone())?;
            let band = fixture("scan.band", ctx.fixtures().scan_band())?;
            let (mut aps, mut count) = (Vec::new(), 0);
            expect_status(
                GET_SPECIFIC_SSID_INFO,
                ctx.hal()
                    .get_specific_ssid_info(Some(ssid.as_str()), band, Some(&mut aps), Some(&mut count)),
                HalStatus::Ok,
            )?;
            check_scan(GET_SPECIFIC_SSID_INFO, &aps, count)?;
            expect(
                !aps.is_empty(),
                format!("{GET_SPECIFIC_SSID_INFO}: '{ssid}' not found"),
            )?;
            for ap in &aps {
                expect(
                    ap.ssid == ssid,
                    format!("{GET_SPECIFIC_SSID_INFO}: returned '{}' for '{ssid}'", ap.ssid),
                )?;
                if let Some(label) = band.label() {
                    expect_one_of(
                        GET_SPECIFIC_SSID_INFO,
                        "ap_OperatingFrequencyBand",
                        &ap.operating_frequency_band,
                        &[label],
                    )?;
                }
            }
            Ok(())
        },
    )
}

fn specific_ssid_negatives() -> Vec<TestCase> {
    vec![
        null_arg_case(GET_SPECIFIC_SSID_INFO, "ssid", |ctx| {
            let (mut aps, mut count) = (Vec::new(), 0);
            ctx.hal()
                .get_specific_ssid_info(None, FreqBand::None, Some(&mut aps), Some(&mut count))
        }),
        null_arg_case(GET_SPECIFIC_SSID_INFO, "output", |ctx| {
            let mut count = 0;
            ctx.hal()
                .get_specific_ssid_info(Some(PROBE_SSID), FreqBand::None, None, Some(&mut count))
        }),
        null_arg_case(GET_SPECIFIC_SSID_INFO, "count", |ctx| {
            let mut aps = Vec::new();
            ctx.hal()
                .get_specific_ssid_info(Some(PROBE_SSID), FreqBand::None, Some(&mut aps), None)
        }),
    ]
}

fn freq_list_positive() -> TestCase {
    TestCase::positive(
        "wifi_setRadioScanningFreqList_positive",
        SET_SCANNING_FREQ_LIST,
        "accepts the fixture frequency list",
        |ctx| {
            let list = fixture("scan.freq_list", ctx.fixtures().scan.freq_list.clone())?;
            let radio = ctx.radio_index();
            expect_status(
                SET_SCANNING_FREQ_LIST,
                ctx.hal().set_radio_scanning_freq_list(radio, Some(list.as_str())),
                HalStatus::Ok,
            )
        },
    )
}

fn freq_list_negatives() -> Vec<TestCase> {
    vec![
        invalid_index_case(SET_SCANNING_FREQ_LIST, |ctx, index| {
            ctx.hal().set_radio_scanning_freq_list(index, Some(PROBE_FREQ_LIST))
        }),
        null_arg_case(SET_SCANNING_FREQ_LIST, "list", |ctx| {
            let radio = ctx.radio_index();
            ctx.hal().set_radio_scanning_freq_list(radio, None)
        }),
        TestCase::negative(
            "wifi_setRadioScanningFreqList_malformed",
            SET_SCANNING_FREQ_LIST,
            "rejects a list that is not frequencies",
            |ctx| {
                let radio = ctx.radio_index();
                expect_status(
                    SET_SCANNING_FREQ_LIST,
                    ctx.hal().set_radio_scanning_freq_list(radio, Some("abc")),
                    HalStatus::Err,
                )
            },
        ),
    ]
}

fn wait_for_scan_positive() -> TestCase {
    TestCase::positive(
        "wifi_waitForScanResults_positive",
        WAIT_FOR_SCAN_RESULTS,
        "returns within the scan timeout",
        |ctx| {
            let limit = ctx.settings().scan_timeout;
            let timer = Timer::start(WAIT_FOR_SCAN_RESULTS);
            let status = ctx.hal().wait_for_scan_results();
            expect(
                !timer.exceeded(limit),
                format!("{WAIT_FOR_SCAN_RESULTS} took longer than {}s", limit.as_secs()),
            )?;
            expect_status(WAIT_FOR_SCAN_RESULTS, status, HalStatus::Ok)
        },
    )
}

pub(crate) fn init_cases() -> Vec<TestCase> {
    let mut cases: Vec<TestCase> = SsidStringParam::all().into_iter().map(ssid_string_positive).collect();
    cases.push(traffic_positive());
    for getter in getters() {
        cases.extend(getter.negative_cases());
    }
    cases.push(neighboring_positive());
    cases.extend(neighboring_negatives());
    cases.push(specific_ssid_positive());
    cases.extend(specific_ssid_negatives());
    cases.push(freq_list_positive());
    cases.extend(freq_list_negatives());
    cases.push(wait_for_scan_positive());
    cases
}

pub(crate) fn init_with_config_cases() -> Vec<TestCase> {
    vec![
        ssid_string_positive(SsidStringParam::MacAddress),
        neighboring_positive(),
        specific_ssid_positive(),
        freq_list_positive(),
    ]
}
