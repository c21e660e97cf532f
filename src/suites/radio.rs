//! Common HAL: version, station stats, entry counts, per-radio getters

use tracing::debug;

use super::{validate, ApiProbe, IndexKind, IndexedGetter};
use crate::executor::{expect, expect_format, expect_one_of, expect_status, fixture, TestContext, TestFailure};
use crate::hal::api::{
    self, GET_HAL_VERSION, GET_RADIO_NUMBER_OF_ENTRIES, GET_RADIO_STANDARD,
    GET_RADIO_TRAFFIC_STATS, GET_SSID_NUMBER_OF_ENTRIES, GET_STATS,
};
use crate::hal::{
    HalStatus, RadioBoolParam, RadioIntParam, RadioStringParam, RadioTrafficStats,
    RadioUlongParam, StaStats,
};
use crate::models::TestCase;

/// Format check and its description for each string getter
fn string_format(param: RadioStringParam) -> (fn(&str) -> bool, &'static str) {
    match param {
        RadioStringParam::IfName => (validate::is_interface_name, "an interface name"),
        RadioStringParam::MaxBitRate => (validate::is_bit_rate, "a bit rate"),
        RadioStringParam::SupportedFrequencyBands => {
            (validate::is_band_list, "a list of frequency bands")
        }
        RadioStringParam::OperatingFrequencyBand => {
            (validate::is_frequency_band, "a frequency band")
        }
        RadioStringParam::SupportedStandards => {
            (validate::is_standard_list, "a list of 802.11 standards")
        }
        RadioStringParam::PossibleChannels | RadioStringParam::ChannelsInUse => {
            (validate::is_channel_list, "a channel list")
        }
        RadioStringParam::GuardInterval => (validate::is_guard_interval, "a guard interval"),
        RadioStringParam::OperatingChannelBandwidth => {
            (validate::is_channel_bandwidth, "a channel bandwidth")
        }
        RadioStringParam::ExtChannel => (validate::is_ext_channel, "an extension channel"),
        RadioStringParam::TransmitPowerSupported => {
            (validate::is_transmit_power_list, "a list of power percentages")
        }
        RadioStringParam::RegulatoryDomain => {
            (validate::is_regulatory_domain, "a regulatory domain")
        }
    }
}

fn read_string(ctx: &mut TestContext, param: RadioStringParam) -> Result<String, TestFailure> {
    let radio = ctx.radio_index();
    let mut value = String::new();
    expect_status(
        param.api(),
        ctx.hal().get_radio_string(param, radio, Some(&mut value)),
        HalStatus::Ok,
    )?;
    Ok(value)
}

fn stats_getter() -> IndexedGetter {
    IndexedGetter::new(GET_STATS, IndexKind::Radio, |ctx, index, with_output| {
        let mut stats = StaStats::default();
        ctx.hal().get_stats(index, with_output.then_some(&mut stats))
    })
}

fn bool_getter(param: RadioBoolParam) -> IndexedGetter {
    IndexedGetter::new(param.api(), IndexKind::Radio, move |ctx, index, with_output| {
        let mut value = false;
        ctx.hal().get_radio_bool(param, index, with_output.then_some(&mut value))
    })
}

fn string_getter(param: RadioStringParam) -> IndexedGetter {
    IndexedGetter::new(param.api(), IndexKind::Radio, move |ctx, index, with_output| {
        let mut value = String::new();
        ctx.hal().get_radio_string(param, index, with_output.then_some(&mut value))
    })
}

fn ulong_getter(param: RadioUlongParam) -> IndexedGetter {
    IndexedGetter::new(param.api(), IndexKind::Radio, move |ctx, index, with_output| {
        let mut value = 0;
        ctx.hal().get_radio_ulong(param, index, with_output.then_some(&mut value))
    })
}

fn int_getter(param: RadioIntParam) -> IndexedGetter {
    IndexedGetter::new(param.api(), IndexKind::Radio, move |ctx, index, with_output| {
        let mut value = 0;
        ctx.hal().get_radio_int(param, index, with_output.then_some(&mut value))
    })
}

fn standard_getter() -> IndexedGetter {
    IndexedGetter::new(GET_RADIO_STANDARD, IndexKind::Radio, |ctx, index, with_output| {
        let mut standard = String::new();
        let (mut g_only, mut n_only, mut ac_only) = (false, false, false);
        ctx.hal().get_radio_standard(
            index,
            with_output.then_some(&mut standard),
            Some(&mut g_only),
            Some(&mut n_only),
            Some(&mut ac_only),
        )
    })
}

fn traffic_getter() -> IndexedGetter {
    IndexedGetter::new(GET_RADIO_TRAFFIC_STATS, IndexKind::Radio, |ctx, index, with_output| {
        let mut stats = RadioTrafficStats::default();
        ctx.hal().get_radio_traffic_stats(index, with_output.then_some(&mut stats))
    })
}

fn getters() -> Vec<IndexedGetter> {
    let mut getters = vec![stats_getter()];
    getters.extend(RadioBoolParam::all().into_iter().map(bool_getter));
    getters.extend(RadioStringParam::all().into_iter().map(string_getter));
    getters.push(standard_getter());
    getters.extend(RadioUlongParam::all().into_iter().map(ulong_getter));
    getters.extend(RadioIntParam::all().into_iter().map(int_getter));
    getters.push(traffic_getter());
    getters
}

pub(crate) fn probes() -> Vec<ApiProbe> {
    let mut probes = vec![
        ApiProbe::new(GET_HAL_VERSION, |ctx| {
            let mut version = String::new();
            ctx.hal().get_hal_version(Some(&mut version))
        }),
        ApiProbe::new(GET_RADIO_NUMBER_OF_ENTRIES, |ctx| {
            let mut count = 0;
            ctx.hal().get_radio_number_of_entries(Some(&mut count))
        }),
        ApiProbe::new(GET_SSID_NUMBER_OF_ENTRIES, |ctx| {
            let mut count = 0;
            ctx.hal().get_ssid_number_of_entries(Some(&mut count))
        }),
    ];
    probes.extend(getters().iter().map(IndexedGetter::probe));
    probes
}

fn hal_version_positive() -> TestCase {
    TestCase::positive(
        "wifi_getHalVersion_positive",
        GET_HAL_VERSION,
        "reports a major.minor version",
        |ctx| {
            let mut version = String::new();
            expect_status(GET_HAL_VERSION, ctx.hal().get_hal_version(Some(&mut version)), HalStatus::Ok)?;
            expect_format(GET_HAL_VERSION, "version", &version, validate::is_hal_version, "major.minor")
        },
    )
}

fn stats_positive() -> TestCase {
    TestCase::positive(
        "wifi_getStats_positive",
        GET_STATS,
        "reports station stats with known security and encryption modes",
        |ctx| {
            let radio = ctx.radio_index();
            let mut stats = StaStats::default();
            expect_status(GET_STATS, ctx.hal().get_stats(radio, Some(&mut stats)), HalStatus::Ok)?;
            expect_one_of(GET_STATS, "sec_mode", &stats.sec_mode, validate::SECURITY_MODES)?;
            expect_one_of(GET_STATS, "encryption", &stats.encryption, validate::ENCRYPTION_MODES)?;
            expect(
                stats.bssid.is_empty() || validate::is_mac_address(&stats.bssid),
                format!("{GET_STATS}: bssid '{}' is not a MAC address", stats.bssid),
            )?;
            expect(
                stats.band.is_empty() || validate::is_frequency_band(&stats.band),
                format!("{GET_STATS}: band '{}' is not a frequency band", stats.band),
            )
        },
    )
}

fn count_positive(api: &'static str, radios: bool) -> TestCase {
    TestCase::positive(format!("{api}_positive"), api, "reports at least one entry", move |ctx| {
        let mut count = 0;
        let status = if radios {
            ctx.hal().get_radio_number_of_entries(Some(&mut count))
        } else {
            ctx.hal().get_ssid_number_of_entries(Some(&mut count))
        };
        expect_status(api, status, HalStatus::Ok)?;
        expect(count >= 1, format!("{api} reported {count} entries"))
    })
}

fn count_null_output(api: &'static str, radios: bool) -> TestCase {
    super::null_arg_case(api, "output", move |ctx| {
        if radios {
            ctx.hal().get_radio_number_of_entries(None)
        } else {
            ctx.hal().get_ssid_number_of_entries(None)
        }
    })
}

fn bool_positive(param: RadioBoolParam) -> TestCase {
    let api = param.api();
    TestCase::positive(format!("{api}_positive"), api, "reports a flag", move |ctx| {
        let radio = ctx.radio_index();
        let mut value = false;
        expect_status(api, ctx.hal().get_radio_bool(param, radio, Some(&mut value)), HalStatus::Ok)?;
        debug!("{} = {}", api, value);
        Ok(())
    })
}

fn string_positive(param: RadioStringParam) -> TestCase {
    let api = param.api();
    let (check, what) = string_format(param);
    TestCase::positive(format!("{api}_positive"), api, format!("reports {what}"), move |ctx| {
        let value = read_string(ctx, param)?;
        expect_format(api, "output", &value, check, what)
    })
}

fn standard_positive() -> TestCase {
    TestCase::positive(
        "wifi_getRadioStandard_positive",
        GET_RADIO_STANDARD,
        "reports an 802.11 standard and at most one only-flag",
        |ctx| {
            let radio = ctx.radio_index();
            let mut standard = String::new();
            let (mut g_only, mut n_only, mut ac_only) = (false, false, false);
            let status = ctx.hal().get_radio_standard(
                radio,
                Some(&mut standard),
                Some(&mut g_only),
                Some(&mut n_only),
                Some(&mut ac_only),
            );
            expect_status(GET_RADIO_STANDARD, status, HalStatus::Ok)?;
            expect_format(GET_RADIO_STANDARD, "standard", &standard, validate::is_standard, "an 802.11 standard")?;
            let set = [g_only, n_only, ac_only].iter().filter(|f| **f).count();
            expect(
                set <= 1,
                format!("{GET_RADIO_STANDARD}: {set} of gOnly/nOnly/acOnly are set"),
            )
        },
    )
}

fn standard_null_flags() -> TestCase {
    super::null_arg_case(GET_RADIO_STANDARD, "flags", |ctx| {
        let radio = ctx.radio_index();
        let mut standard = String::new();
        ctx.hal().get_radio_standard(radio, Some(&mut standard), None, None, None)
    })
}

fn ulong_positive(param: RadioUlongParam) -> TestCase {
    let api = param.api();
    TestCase::positive(format!("{api}_positive"), api, "reports an in-range value", move |ctx| {
        let radio = ctx.radio_index();
        let mut value = 0;
        expect_status(api, ctx.hal().get_radio_ulong(param, radio, Some(&mut value)), HalStatus::Ok)?;
        match param {
            RadioUlongParam::Channel => expect(
                (1..=233).contains(&value),
                format!("{api}: channel {value} is outside 1..=233"),
            ),
            RadioUlongParam::AutoChannelRefreshPeriod => Ok(()),
        }
    })
}

fn int_positive(param: RadioIntParam) -> TestCase {
    let api = param.api();
    let range = match param {
        RadioIntParam::Mcs => 0..=15,
        RadioIntParam::TransmitPower => 0..=100,
    };
    TestCase::positive(format!("{api}_positive"), api, "reports an in-range value", move |ctx| {
        let radio = ctx.radio_index();
        let mut value = 0;
        expect_status(api, ctx.hal().get_radio_int(param, radio, Some(&mut value)), HalStatus::Ok)?;
        expect(
            range.contains(&value),
            format!("{api}: {value} is outside {}..={}", range.start(), range.end()),
        )
    })
}

fn traffic_positive() -> TestCase {
    TestCase::positive(
        "wifi_getRadioTrafficStats_positive",
        GET_RADIO_TRAFFIC_STATS,
        "reports radio traffic counters",
        |ctx| {
            let radio = ctx.radio_index();
            let mut stats = RadioTrafficStats::default();
            expect_status(
                GET_RADIO_TRAFFIC_STATS,
                ctx.hal().get_radio_traffic_stats(radio, Some(&mut stats)),
                HalStatus::Ok,
            )?;
            debug!(
                "radio {}: {} bytes sent, {} received",
                radio, stats.bytes_sent, stats.bytes_received
            );
            Ok(())
        },
    )
}

/// Radio indices are C `INT`s; a larger count cannot be iterated
fn radio_indices(count: u64) -> Result<i32, TestFailure> {
    i32::try_from(count).map_err(|_| {
        TestFailure::new(format!(
            "{GET_RADIO_NUMBER_OF_ENTRIES} reported {count} radios, more than an INT index can address"
        ))
    })
}

fn dual_band_positive() -> TestCase {
    TestCase::positive(
        "wifi_getDualBandSupport_positive",
        api::GET_DUAL_BAND_SUPPORT,
        "dual-band support agrees with the radios' supported bands",
        |ctx| {
            let dual_band = ctx.hal().get_dual_band_support();
            let mut count = 0;
            expect_status(
                GET_RADIO_NUMBER_OF_ENTRIES,
                ctx.hal().get_radio_number_of_entries(Some(&mut count)),
                HalStatus::Ok,
            )?;

            let radios = radio_indices(count)?;

            let mut bands = Vec::new();
            for radio in 0..radios {
                let mut value = String::new();
                let param = RadioStringParam::SupportedFrequencyBands;
                expect_status(
                    param.api(),
                    ctx.hal().get_radio_string(param, radio, Some(&mut value)),
                    HalStatus::Ok,
                )?;
                bands.extend(value.split(',').map(|b| b.trim().to_string()));
            }

            let has_both = ["2.4GHz", "5GHz"]
                .iter()
                .all(|band| bands.iter().any(|b| b == band));
            expect(
                dual_band == has_both,
                format!(
                    "{} returned {}, radios support [{}]",
                    api::GET_DUAL_BAND_SUPPORT,
                    dual_band,
                    bands.join(", ")
                ),
            )
        },
    )
}

/// `wifi_getDualBandSupport` has no status to return; the answer is a
/// hardware property and must not change once the HAL is initialized
pub(crate) fn dual_band_before_init_case() -> TestCase {
    TestCase::negative(
        "wifi_getDualBandSupport_before_init",
        api::GET_DUAL_BAND_SUPPORT,
        "same answer before wifi_init as after",
        |ctx| {
            let before = ctx.hal().get_dual_band_support();
            expect_status(api::WIFI_INIT, ctx.init(), HalStatus::Ok)?;
            let after = ctx.hal().get_dual_band_support();
            expect_status(api::WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)?;
            expect(
                before == after,
                format!(
                    "{} returned {before} before wifi_init and {after} after",
                    api::GET_DUAL_BAND_SUPPORT
                ),
            )
        },
    )
}

pub(crate) fn init_cases() -> Vec<TestCase> {
    let mut cases = vec![
        hal_version_positive(),
        super::null_arg_case(GET_HAL_VERSION, "output", |ctx| ctx.hal().get_hal_version(None)),
        stats_positive(),
        count_positive(GET_RADIO_NUMBER_OF_ENTRIES, true),
        count_null_output(GET_RADIO_NUMBER_OF_ENTRIES, true),
        count_positive(GET_SSID_NUMBER_OF_ENTRIES, false),
        count_null_output(GET_SSID_NUMBER_OF_ENTRIES, false),
    ];
    cases.extend(RadioBoolParam::all().into_iter().map(bool_positive));
    cases.extend(RadioStringParam::all().into_iter().map(string_positive));
    cases.push(standard_positive());
    cases.push(standard_null_flags());
    cases.extend(RadioUlongParam::all().into_iter().map(ulong_positive));
    cases.extend(RadioIntParam::all().into_iter().map(int_positive));
    cases.push(traffic_positive());
    cases.push(dual_band_positive());
    for getter in getters() {
        cases.extend(getter.negative_cases());
    }
    cases
}

fn if_name_matches_config() -> TestCase {
    let param = RadioStringParam::IfName;
    TestCase::positive(
        "wifi_getRadioIfName_matches_config",
        param.api(),
        "radio interface name is the one passed to wifi_initWithConfig",
        move |ctx| {
            let interface = fixture("interface", ctx.fixtures().interface.clone())?;
            let value = read_string(ctx, param)?;
            expect(
                value == interface,
                format!("{}: '{}' is not the configured interface '{}'", param.api(), value, interface),
            )
        },
    )
}

pub(crate) fn init_with_config_cases() -> Vec<TestCase> {
    vec![
        hal_version_positive(),
        stats_positive(),
        count_positive(GET_RADIO_NUMBER_OF_ENTRIES, true),
        if_name_matches_config(),
        string_positive(RadioStringParam::OperatingFrequencyBand),
        standard_positive(),
        ulong_positive(RadioUlongParam::Channel),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::hal::SimHal;
    use crate::models::Precondition;

    fn context() -> TestContext {
        TestContext::new(Box::new(SimHal::new()), Fixtures::example())
    }

    #[test]
    fn test_radio_indices_rejects_overflow() {
        assert_eq!(radio_indices(2).unwrap(), 2);
        assert_eq!(radio_indices(i32::MAX as u64).unwrap(), i32::MAX);

        let err = radio_indices(u64::from(u32::MAX) + 2).unwrap_err();
        assert!(err.message.contains("4294967297 radios"), "{}", err.message);
    }

    #[test]
    fn test_dual_band_before_init_compares_both_states() {
        let case = dual_band_before_init_case();
        let mut ctx = context();
        (case.func)(&mut ctx).unwrap();
        assert_eq!(ctx.state(), Precondition::NoInit);
    }

    #[test]
    fn test_dual_band_before_init_fails_when_init_rejected() {
        let case = dual_band_before_init_case();
        let mut ctx = context();
        assert!(ctx.init().is_ok());

        let err = (case.func)(&mut ctx).unwrap_err();
        assert!(err.message.contains(api::WIFI_INIT), "{}", err.message);
    }
}
