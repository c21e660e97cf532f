//! Client HAL: connect/disconnect, saved SSID, roaming, WPS, callbacks
//!
//! Connect and disconnect report their outcome asynchronously through the
//! registered callbacks; positive cases wait for the final callback event
//! up to the run's connect timeout.

use super::{invalid_index_case, null_arg_case, validate, ApiProbe, IndexKind, IndexedGetter};
use crate::executor::{
    expect, expect_one_of, expect_status, fixture, CallbackEvent, TestContext, TestFailure,
};
use crate::hal::api::{
    CANCEL_WPS_PAIRING, CLEAR_SSID_INFO, CONNECT_CALLBACK_REGISTER, CONNECT_ENDPOINT,
    DISCONNECT_CALLBACK_REGISTER, DISCONNECT_ENDPOINT, GET_ROAMING_CONTROL,
    LAST_CONNECTED_ENDPOINT, SET_ROAMING_CONTROL, SET_WPS_BUTTON_PUSH,
};
use crate::hal::{ConnectRequest, ConnectStatus, HalStatus, PairedSsidInfo, RoamingCtrl, SecurityMode};
use crate::models::TestCase;

const PROBE_SSID: &str = "l1-probe";
const PROBE_PASSPHRASE: &str = "l1-probe-passphrase";
const WRONG_PASSPHRASE: &str = "l1-wrong-passphrase";

fn probe_request() -> ConnectRequest {
    ConnectRequest::new(PROBE_SSID, SecurityMode::Wpa2PskAes).passphrase(PROBE_PASSPHRASE)
}

/// Request for the fixture access point
fn ap_request(ctx: &TestContext) -> Result<ConnectRequest, TestFailure> {
    let ap = &ctx.fixtures().access_point;
    let ssid = fixture("access_point.ssid", ap.ssid.clone())?;
    let mode = fixture("access_point.security_mode", ctx.fixtures().ap_security_mode())?;

    let mut request = ConnectRequest::new(ssid, mode);
    if let Some(passphrase) = &ap.passphrase {
        request = request.passphrase(passphrase.as_str());
    }
    if let Some(psk) = &ap.psk {
        request = request.psk(psk.as_str());
    }
    if let Some(key) = &ap.wep_key {
        request = request.wep_key(key.as_str());
    }
    Ok(request)
}

fn enterprise_request(ctx: &TestContext) -> Result<ConnectRequest, TestFailure> {
    let ent = &ctx.fixtures().enterprise;
    let ssid = fixture("enterprise.ssid", ent.ssid.clone())?;
    let mode = fixture("enterprise.security_mode", ctx.fixtures().enterprise_security_mode())?;
    let identity = fixture("enterprise.eap_identity", ent.eap_identity.clone())?;
    let ca_root_cert = fixture("enterprise.ca_root_cert", ent.ca_root_cert.clone())?;

    Ok(ConnectRequest::new(ssid, mode).enterprise(
        identity,
        ca_root_cert,
        ent.client_cert.clone().unwrap_or_default(),
        ent.private_key.clone().unwrap_or_default(),
    ))
}

fn ssid_of(request: &ConnectRequest) -> String {
    request.ssid.clone().unwrap_or_default()
}

/// Connect, returning the final connect callback event
fn connect(ctx: &mut TestContext, request: &ConnectRequest) -> Result<CallbackEvent, TestFailure> {
    let events = ctx.capture_connect_events();
    let index = ctx.ssid_index();
    expect_status(CONNECT_ENDPOINT, ctx.hal().connect_endpoint(index, request), HalStatus::Ok)?;

    let timeout = ctx.settings().connect_timeout;
    events.wait_final(timeout).ok_or_else(|| {
        TestFailure::new(format!(
            "{CONNECT_ENDPOINT}: no connect callback within {}s",
            timeout.as_secs()
        ))
    })
}

fn connect_expecting_success(ctx: &mut TestContext, request: &ConnectRequest) -> Result<(), TestFailure> {
    let event = connect(ctx, request)?;
    expect(
        event.status == ConnectStatus::Connected,
        format!("{CONNECT_ENDPOINT}: callback reported {:?} for '{}'", event.status, event.ssid),
    )
}

fn disconnect(ctx: &mut TestContext, ssid: &str) -> Result<(), TestFailure> {
    let index = ctx.ssid_index();
    expect_status(
        DISCONNECT_ENDPOINT,
        ctx.hal().disconnect_endpoint(index, Some(ssid)),
        HalStatus::Ok,
    )
}

fn roaming_getter() -> IndexedGetter {
    IndexedGetter::new(GET_ROAMING_CONTROL, IndexKind::Ssid, |ctx, index, with_output| {
        let mut ctrl = RoamingCtrl::default();
        ctx.hal().get_roaming_control(index, with_output.then_some(&mut ctrl))
    })
}

pub(crate) fn probes() -> Vec<ApiProbe> {
    vec![
        ApiProbe::new(CONNECT_ENDPOINT, |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().connect_endpoint(index, &probe_request())
        }),
        ApiProbe::new(DISCONNECT_ENDPOINT, |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().disconnect_endpoint(index, Some(PROBE_SSID))
        }),
        ApiProbe::new(CLEAR_SSID_INFO, |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().clear_ssid_info(index)
        }),
        ApiProbe::new(LAST_CONNECTED_ENDPOINT, |ctx| {
            let mut info = PairedSsidInfo::default();
            ctx.hal().last_connected_endpoint(Some(&mut info))
        })
        .with_arm(|ctx| {
            let request = ap_request(ctx)?.save(true);
            connect_expecting_success(ctx, &request)
        })
        .with_disarm(|ctx| {
            let index = ctx.ssid_index();
            let _ = ctx.hal().clear_ssid_info(index);
        }),
        ApiProbe::new(SET_ROAMING_CONTROL, |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().set_roaming_control(index, Some(&RoamingCtrl::typical()))
        }),
        roaming_getter().probe(),
        ApiProbe::new(SET_WPS_BUTTON_PUSH, |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().set_cli_wps_button_push(index)
        }),
        ApiProbe::new(CANCEL_WPS_PAIRING, |ctx| ctx.hal().cancel_wps_pairing()).with_arm(|ctx| {
            let index = ctx.ssid_index();
            expect_status(SET_WPS_BUTTON_PUSH, ctx.hal().set_cli_wps_button_push(index), HalStatus::Ok)
        })
        .with_disarm(|ctx| {
            let _ = ctx.hal().cancel_wps_pairing();
        }),
    ]
}

fn connect_positive() -> TestCase {
    TestCase::positive(
        "wifi_connectEndpoint_positive",
        CONNECT_ENDPOINT,
        "connects to the fixture access point",
        |ctx| {
            let request = ap_request(ctx)?;
            connect_expecting_success(ctx, &request)?;
            disconnect(ctx, &ssid_of(&request))
        },
    )
}

fn connect_enterprise() -> TestCase {
    TestCase::positive(
        "wifi_connectEndpoint_enterprise",
        CONNECT_ENDPOINT,
        "connects to the fixture enterprise access point",
        |ctx| {
            let request = enterprise_request(ctx)?;
            connect_expecting_success(ctx, &request)?;
            disconnect(ctx, &ssid_of(&request))
        },
    )
}

fn connect_negatives() -> Vec<TestCase> {
    vec![
        TestCase::negative(
            "wifi_connectEndpoint_wrong_passphrase",
            CONNECT_ENDPOINT,
            "accepted, then the callback reports an error",
            |ctx| {
                let mut request = ap_request(ctx)?;
                request.security_mode = SecurityMode::Wpa2PskAes;
                request.pre_shared_key = Some(String::new());
                let request = request.passphrase(WRONG_PASSPHRASE);
                let event = connect(ctx, &request)?;
                expect(
                    event.status.is_error(),
                    format!("{CONNECT_ENDPOINT}: callback reported {:?}, expected an error", event.status),
                )
            },
        ),
        TestCase::negative(
            "wifi_connectEndpoint_null_ssid",
            CONNECT_ENDPOINT,
            "rejects a NULL SSID",
            |ctx| {
                let mut request = probe_request();
                request.ssid = None;
                let index = ctx.ssid_index();
                expect_status(CONNECT_ENDPOINT, ctx.hal().connect_endpoint(index, &request), HalStatus::Err)
            },
        ),
        TestCase::negative(
            "wifi_connectEndpoint_short_passphrase",
            CONNECT_ENDPOINT,
            "rejects a passphrase shorter than 8 characters",
            |ctx| {
                let request = ConnectRequest::new(PROBE_SSID, SecurityMode::Wpa2PskAes).passphrase("short");
                let index = ctx.ssid_index();
                expect_status(CONNECT_ENDPOINT, ctx.hal().connect_endpoint(index, &request), HalStatus::Err)
            },
        ),
        TestCase::negative(
            "wifi_connectEndpoint_unsupported_mode",
            CONNECT_ENDPOINT,
            "rejects WIFI_SECURITY_NOT_SUPPORTED",
            |ctx| {
                let request = ConnectRequest::new(PROBE_SSID, SecurityMode::NotSupported)
                    .passphrase(PROBE_PASSPHRASE);
                let index = ctx.ssid_index();
                expect_status(CONNECT_ENDPOINT, ctx.hal().connect_endpoint(index, &request), HalStatus::Err)
            },
        ),
        invalid_index_case(CONNECT_ENDPOINT, |ctx, index| {
            ctx.hal().connect_endpoint(index, &probe_request())
        }),
    ]
}

fn disconnect_positive() -> TestCase {
    TestCase::positive(
        "wifi_disconnectEndpoint_positive",
        DISCONNECT_ENDPOINT,
        "disconnects and the callback reports Disconnected",
        |ctx| {
            let request = ap_request(ctx)?;
            connect_expecting_success(ctx, &request)?;

            let events = ctx.capture_disconnect_events();
            disconnect(ctx, &ssid_of(&request))?;
            let timeout = ctx.settings().connect_timeout;
            let event = events.wait_final(timeout).ok_or_else(|| {
                TestFailure::new(format!(
                    "{DISCONNECT_ENDPOINT}: no disconnect callback within {}s",
                    timeout.as_secs()
                ))
            })?;
            expect(
                event.status == ConnectStatus::Disconnected,
                format!("{DISCONNECT_ENDPOINT}: callback reported {:?}", event.status),
            )
        },
    )
}

fn disconnect_negatives() -> Vec<TestCase> {
    vec![
        null_arg_case(DISCONNECT_ENDPOINT, "ssid", |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().disconnect_endpoint(index, None)
        }),
        invalid_index_case(DISCONNECT_ENDPOINT, |ctx, index| {
            ctx.hal().disconnect_endpoint(index, Some(PROBE_SSID))
        }),
    ]
}

fn saved_ssid_cases() -> Vec<TestCase> {
    vec![
        TestCase::positive(
            "wifi_clearSSIDInfo_positive",
            CLEAR_SSID_INFO,
            "clears the saved SSID",
            |ctx| {
                let index = ctx.ssid_index();
                expect_status(CLEAR_SSID_INFO, ctx.hal().clear_ssid_info(index), HalStatus::Ok)
            },
        ),
        invalid_index_case(CLEAR_SSID_INFO, |ctx, index| ctx.hal().clear_ssid_info(index)),
        TestCase::positive(
            "wifi_lastConnected_Endpoint_positive",
            LAST_CONNECTED_ENDPOINT,
            "reports the access point saved by the last connect",
            |ctx| {
                let request = ap_request(ctx)?.save(true);
                let ssid = ssid_of(&request);
                connect_expecting_success(ctx, &request)?;
                disconnect(ctx, &ssid)?;

                let mut info = PairedSsidInfo::default();
                expect_status(
                    LAST_CONNECTED_ENDPOINT,
                    ctx.hal().last_connected_endpoint(Some(&mut info)),
                    HalStatus::Ok,
                )?;
                expect(
                    info.ssid == ssid,
                    format!("{LAST_CONNECTED_ENDPOINT}: ssid '{}', expected '{}'", info.ssid, ssid),
                )?;
                expect_one_of(LAST_CONNECTED_ENDPOINT, "security", &info.security, validate::SECURITY_MODES)
            },
        ),
        TestCase::negative(
            "wifi_lastConnected_Endpoint_null_output",
            LAST_CONNECTED_ENDPOINT,
            "rejects a NULL output with a saved SSID present",
            |ctx| {
                let request = ap_request(ctx)?.save(true);
                connect_expecting_success(ctx, &request)?;
                disconnect(ctx, &ssid_of(&request))?;
                expect_status(
                    LAST_CONNECTED_ENDPOINT,
                    ctx.hal().last_connected_endpoint(None),
                    HalStatus::Err,
                )
            },
        ),
        TestCase::negative(
            "wifi_lastConnected_Endpoint_after_clear",
            LAST_CONNECTED_ENDPOINT,
            "nothing is reported once wifi_clearSSIDInfo ran",
            |ctx| {
                let request = ap_request(ctx)?.save(true);
                connect_expecting_success(ctx, &request)?;
                disconnect(ctx, &ssid_of(&request))?;

                let index = ctx.ssid_index();
                expect_status(CLEAR_SSID_INFO, ctx.hal().clear_ssid_info(index), HalStatus::Ok)?;
                let mut info = PairedSsidInfo::default();
                expect_status(
                    LAST_CONNECTED_ENDPOINT,
                    ctx.hal().last_connected_endpoint(Some(&mut info)),
                    HalStatus::Err,
                )
            },
        ),
    ]
}

fn roaming_positive() -> TestCase {
    TestCase::positive(
        "wifi_setRoamingControl_positive",
        SET_ROAMING_CONTROL,
        "a set configuration reads back unchanged",
        |ctx| {
            let index = ctx.ssid_index();
            let ctrl = RoamingCtrl {
                preassn_best_threshold: -70,
                post_assn_back_off_time: 45,
                ..RoamingCtrl::typical()
            };
            expect_status(
                SET_ROAMING_CONTROL,
                ctx.hal().set_roaming_control(index, Some(&ctrl)),
                HalStatus::Ok,
            )?;

            let mut read = RoamingCtrl::default();
            expect_status(
                GET_ROAMING_CONTROL,
                ctx.hal().get_roaming_control(index, Some(&mut read)),
                HalStatus::Ok,
            )?;
            expect(
                read == ctrl,
                format!("{GET_ROAMING_CONTROL}: read back {read:?}, set {ctrl:?}"),
            )?;
            expect_status(
                SET_ROAMING_CONTROL,
                ctx.hal().set_roaming_control(index, Some(&RoamingCtrl::typical())),
                HalStatus::Ok,
            )
        },
    )
}

fn roaming_cases() -> Vec<TestCase> {
    let mut cases = vec![
        roaming_positive(),
        null_arg_case(SET_ROAMING_CONTROL, "input", |ctx| {
            let index = ctx.ssid_index();
            ctx.hal().set_roaming_control(index, None)
        }),
        invalid_index_case(SET_ROAMING_CONTROL, |ctx, index| {
            ctx.hal().set_roaming_control(index, Some(&RoamingCtrl::typical()))
        }),
        TestCase::negative(
            "wifi_setRoamingControl_out_of_range",
            SET_ROAMING_CONTROL,
            "rejects an enable flag other than 0 or 1",
            |ctx| {
                let index = ctx.ssid_index();
                let ctrl = RoamingCtrl {
                    roaming_enable: 2,
                    ..RoamingCtrl::typical()
                };
                expect_status(
                    SET_ROAMING_CONTROL,
                    ctx.hal().set_roaming_control(index, Some(&ctrl)),
                    HalStatus::Err,
                )
            },
        ),
        TestCase::positive(
            "wifi_getRoamingControl_positive",
            GET_ROAMING_CONTROL,
            "enable flags are 0 or 1",
            |ctx| {
                let index = ctx.ssid_index();
                let mut ctrl = RoamingCtrl::default();
                expect_status(
                    GET_ROAMING_CONTROL,
                    ctx.hal().get_roaming_control(index, Some(&mut ctrl)),
                    HalStatus::Ok,
                )?;
                let flags = [ctrl.roaming_enable, ctrl.self_steer_override, ctrl.roam_80211kvr_enable];
                expect(
                    flags.iter().all(|f| *f == 0 || *f == 1),
                    format!("{GET_ROAMING_CONTROL}: enable flags {flags:?}"),
                )
            },
        ),
    ];
    cases.extend(roaming_getter().negative_cases());
    cases
}

fn wps_cases() -> Vec<TestCase> {
    vec![
        TestCase::positive(
            "wifi_setCliWpsButtonPush_positive",
            SET_WPS_BUTTON_PUSH,
            "starts WPS push-button pairing",
            |ctx| {
                let index = ctx.ssid_index();
                expect_status(SET_WPS_BUTTON_PUSH, ctx.hal().set_cli_wps_button_push(index), HalStatus::Ok)?;
                expect_status(CANCEL_WPS_PAIRING, ctx.hal().cancel_wps_pairing(), HalStatus::Ok)
            },
        ),
        invalid_index_case(SET_WPS_BUTTON_PUSH, |ctx, index| {
            ctx.hal().set_cli_wps_button_push(index)
        }),
        TestCase::positive(
            "wifi_cancelWpsPairing_positive",
            CANCEL_WPS_PAIRING,
            "cancels pairing in progress",
            |ctx| {
                let index = ctx.ssid_index();
                expect_status(SET_WPS_BUTTON_PUSH, ctx.hal().set_cli_wps_button_push(index), HalStatus::Ok)?;
                expect_status(CANCEL_WPS_PAIRING, ctx.hal().cancel_wps_pairing(), HalStatus::Ok)
            },
        ),
        TestCase::negative(
            "wifi_cancelWpsPairing_without_push",
            CANCEL_WPS_PAIRING,
            "rejected when no pairing is in progress",
            |ctx| expect_status(CANCEL_WPS_PAIRING, ctx.hal().cancel_wps_pairing(), HalStatus::Err),
        ),
    ]
}

fn callback_cases() -> Vec<TestCase> {
    vec![
        TestCase::positive(
            "wifi_connectEndpoint_callback_register_positive",
            CONNECT_CALLBACK_REGISTER,
            "a registered callback sees the connect outcome",
            |ctx| {
                let request = ap_request(ctx)?;
                let event = connect(ctx, &request)?;
                expect(
                    event.ssid == ssid_of(&request),
                    format!("{CONNECT_CALLBACK_REGISTER}: event for '{}'", event.ssid),
                )?;
                disconnect(ctx, &ssid_of(&request))
            },
        ),
        TestCase::negative(
            "wifi_connectEndpoint_callback_register_null",
            CONNECT_CALLBACK_REGISTER,
            "connect still succeeds with no callback registered",
            |ctx| {
                ctx.hal().register_connect_callback(None);
                let request = ap_request(ctx)?;
                let index = ctx.ssid_index();
                expect_status(CONNECT_ENDPOINT, ctx.hal().connect_endpoint(index, &request), HalStatus::Ok)?;
                disconnect(ctx, &ssid_of(&request))
            },
        ),
        TestCase::positive(
            "wifi_disconnectEndpoint_callback_register_positive",
            DISCONNECT_CALLBACK_REGISTER,
            "a registered callback sees the disconnect",
            |ctx| {
                let request = ap_request(ctx)?;
                connect_expecting_success(ctx, &request)?;
                let events = ctx.capture_disconnect_events();
                disconnect(ctx, &ssid_of(&request))?;
                let timeout = ctx.settings().connect_timeout;
                expect(
                    events.wait(timeout).is_some(),
                    format!("{DISCONNECT_CALLBACK_REGISTER}: no event within {}s", timeout.as_secs()),
                )
            },
        ),
        TestCase::negative(
            "wifi_disconnectEndpoint_callback_register_null",
            DISCONNECT_CALLBACK_REGISTER,
            "disconnect still succeeds with no callback registered",
            |ctx| {
                let request = ap_request(ctx)?;
                connect_expecting_success(ctx, &request)?;
                ctx.hal().register_disconnect_callback(None);
                disconnect(ctx, &ssid_of(&request))
            },
        ),
    ]
}

pub(crate) fn init_cases() -> Vec<TestCase> {
    let mut cases = vec![connect_positive(), connect_enterprise()];
    cases.extend(connect_negatives());
    cases.push(disconnect_positive());
    cases.extend(disconnect_negatives());
    cases.extend(saved_ssid_cases());
    cases.extend(roaming_cases());
    cases.extend(wps_cases());
    cases.extend(callback_cases());
    cases
}

pub(crate) fn init_with_config_cases() -> Vec<TestCase> {
    vec![connect_positive(), disconnect_positive(), roaming_positive()]
}
