//! Test context and assertions
//!
//! A case receives a [`TestContext`] holding the HAL under test, the
//! fixtures, and the HAL init state as the harness tracks it. Lifecycle
//! calls made through the context keep that tracked state in step with the
//! HAL, which is what lets the runner restore a suite's precondition after
//! a case that changed it.
//!
//! Assertions return `Err(TestFailure)` carrying the caller's source
//! location, so a case body reads as a sequence of `?`-chained checks.

use std::fmt;
use std::panic::Location;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Fixtures;
use crate::hal::{ConnectStatus, EndpointCallback, HalConfig, HalStatus, WifiHal};
use crate::models::Precondition;

/// A failed assertion inside a case
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct TestFailure {
    pub message: String,
    pub location: String,
}

impl TestFailure {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let caller = Location::caller();
        Self {
            message: message.into(),
            location: format!("{}:{}", caller.file(), caller.line()),
        }
    }
}

#[track_caller]
pub fn expect_status(api: &str, actual: HalStatus, expected: HalStatus) -> Result<(), TestFailure> {
    if actual == expected {
        debug!("{} returned {}", api, actual);
        Ok(())
    } else {
        Err(TestFailure::new(format!(
            "{api} returned {actual}, expected {expected}"
        )))
    }
}

#[track_caller]
pub fn expect(condition: bool, message: impl Into<String>) -> Result<(), TestFailure> {
    if condition {
        Ok(())
    } else {
        Err(TestFailure::new(message))
    }
}

/// `value` must be one of `allowed`
#[track_caller]
pub fn expect_one_of(api: &str, field: &str, value: &str, allowed: &[&str]) -> Result<(), TestFailure> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(TestFailure::new(format!(
            "{api}: {field} '{value}' is not one of [{}]",
            allowed.join(", ")
        )))
    }
}

/// `value` must pass `check`; `what` describes the expected format
#[track_caller]
pub fn expect_format(
    api: &str,
    field: &str,
    value: &str,
    check: fn(&str) -> bool,
    what: &str,
) -> Result<(), TestFailure> {
    if check(value) {
        Ok(())
    } else {
        Err(TestFailure::new(format!(
            "{api}: {field} '{value}' is not {what}"
        )))
    }
}

/// Unwrap a fixture value, failing the case when it is absent
#[track_caller]
pub fn fixture<T>(key: &str, value: Option<T>) -> Result<T, TestFailure> {
    match value {
        Some(value) => Ok(value),
        None => {
            error!("fixture value missing: {}", key);
            Err(TestFailure::new(format!("fixture value missing: {key}")))
        }
    }
}

/// Timeouts a run applies to asynchronous HAL behavior
#[derive(Clone, Copy, Debug)]
pub struct RunSettings {
    pub connect_timeout: Duration,
    pub scan_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            scan_timeout: Duration::from_secs(20),
        }
    }
}

/// One connect or disconnect callback invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackEvent {
    pub ssid_index: i32,
    pub ssid: String,
    pub status: ConnectStatus,
}

impl fmt::Display for CallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {:?}", self.ssid_index, self.ssid, self.status)
    }
}

/// Receiving end of a registered callback
pub struct EventCapture {
    receiver: Receiver<CallbackEvent>,
}

impl EventCapture {
    fn register() -> (EndpointCallback, Self) {
        let (sender, receiver) = mpsc::channel();
        let callback: EndpointCallback = Arc::new(move |ssid_index: i32, ssid: &str, status: ConnectStatus| {
            let _ = sender.send(CallbackEvent {
                ssid_index,
                ssid: ssid.to_string(),
                status,
            });
        });
        (callback, Self { receiver })
    }

    /// Next event, or `None` after `timeout`
    pub fn wait(&self, timeout: Duration) -> Option<CallbackEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => {
                debug!("callback event {}", event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next event whose status is not `Connecting`/`Disconnecting`
    pub fn wait_final(&self, timeout: Duration) -> Option<CallbackEvent> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            let event = self.wait(remaining)?;
            if !matches!(
                event.status,
                ConnectStatus::Connecting | ConnectStatus::Disconnecting
            ) {
                return Some(event);
            }
        }
    }
}

/// Everything a case can reach
pub struct TestContext {
    hal: Box<dyn WifiHal>,
    fixtures: Fixtures,
    settings: RunSettings,
    state: Precondition,
    precondition: Precondition,
}

impl TestContext {
    pub fn new(hal: Box<dyn WifiHal>, fixtures: Fixtures) -> Self {
        Self {
            hal,
            fixtures,
            settings: RunSettings::default(),
            state: Precondition::NoInit,
            precondition: Precondition::NoInit,
        }
    }

    pub fn with_settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The HAL, for every call except the lifecycle ones
    pub fn hal(&mut self) -> &mut dyn WifiHal {
        self.hal.as_mut()
    }

    pub fn backend(&self) -> &str {
        self.hal.backend()
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn radio_index(&self) -> i32 {
        self.fixtures.radio_index()
    }

    pub fn ssid_index(&self) -> i32 {
        self.fixtures.ssid_index()
    }

    /// Indices the HAL must reject: `-1` and the fixture's invalid index
    pub fn invalid_indices(&self) -> [i32; 2] {
        [-1, self.fixtures.invalid_index()]
    }

    /// Tracked HAL init state
    pub fn state(&self) -> Precondition {
        self.state
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    pub(crate) fn set_precondition(&mut self, precondition: Precondition) {
        self.precondition = precondition;
    }

    pub fn init(&mut self) -> HalStatus {
        let status = self.hal.init();
        if status.is_ok() {
            self.state = Precondition::Init;
        }
        status
    }

    pub fn init_with_config(&mut self, config: Option<&HalConfig>) -> HalStatus {
        let status = self.hal.init_with_config(config);
        if status.is_ok() {
            self.state = Precondition::InitWithConfig;
        }
        status
    }

    pub fn uninit(&mut self) -> HalStatus {
        let status = self.hal.uninit();
        if status.is_ok() {
            self.state = Precondition::NoInit;
        }
        status
    }

    /// `HalConfig` built from the fixture interface
    #[track_caller]
    pub fn fixture_config(&self) -> Result<HalConfig, TestFailure> {
        let interface = fixture("interface", self.fixtures.interface.clone())?;
        Ok(HalConfig::new(interface))
    }

    /// Bring the HAL to the uninitialized state for a negative case
    #[track_caller]
    pub fn enter_uninitialized(&mut self) -> Result<(), TestFailure> {
        if self.state.initialized() {
            expect_status("wifi_uninit", self.uninit(), HalStatus::Ok)?;
        }
        Ok(())
    }

    /// Re-establish the suite's precondition after a case changed it
    #[track_caller]
    pub fn restore_precondition(&mut self) -> Result<(), TestFailure> {
        if self.state == self.precondition {
            return Ok(());
        }
        if self.state.initialized() {
            expect_status("wifi_uninit", self.uninit(), HalStatus::Ok)?;
        }
        match self.precondition {
            Precondition::NoInit => Ok(()),
            Precondition::Init => expect_status("wifi_init", self.init(), HalStatus::Ok),
            Precondition::InitWithConfig => {
                let config = self.fixture_config()?;
                expect_status(
                    "wifi_initWithConfig",
                    self.init_with_config(Some(&config)),
                    HalStatus::Ok,
                )
            }
        }
    }

    /// Register a connect callback that feeds the returned capture
    pub fn capture_connect_events(&mut self) -> EventCapture {
        let (callback, capture) = EventCapture::register();
        self.hal.register_connect_callback(Some(callback));
        capture
    }

    pub fn capture_disconnect_events(&mut self) -> EventCapture {
        let (callback, capture) = EventCapture::register();
        self.hal.register_disconnect_callback(Some(callback));
        capture
    }

    /// Leave the HAL uninitialized at the end of a run
    pub fn shutdown(&mut self) {
        if self.state.initialized() && !self.uninit().is_ok() {
            warn!("wifi_uninit failed during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimHal;

    fn context() -> TestContext {
        TestContext::new(Box::new(SimHal::new()), Fixtures::example())
    }

    #[test]
    fn test_failure_location() {
        let failure = expect(false, "boom").unwrap_err();
        assert_eq!(failure.message, "boom");
        assert!(failure.location.contains("context.rs"));
    }

    #[test]
    fn test_expect_status_message() {
        let failure = expect_status("wifi_init", HalStatus::Err, HalStatus::Ok).unwrap_err();
        assert_eq!(failure.message, "wifi_init returned RETURN_ERR, expected RETURN_OK");
        assert!(expect_status("wifi_init", HalStatus::Ok, HalStatus::Ok).is_ok());
    }

    #[test]
    fn test_expect_one_of() {
        assert!(expect_one_of("api", "mode", "WPA2-Personal", &["None", "WPA2-Personal"]).is_ok());
        let failure = expect_one_of("api", "mode", "WPA9", &["None"]).unwrap_err();
        assert!(failure.message.contains("'WPA9'"));
    }

    #[test]
    fn test_fixture_missing() {
        let failure = fixture::<String>("access_point.ssid", None).unwrap_err();
        assert_eq!(failure.message, "fixture value missing: access_point.ssid");
        assert_eq!(fixture("radio_index", Some(1)).unwrap(), 1);
    }

    #[test]
    fn test_lifecycle_tracks_state() {
        let mut ctx = context();
        assert_eq!(ctx.init(), HalStatus::Ok);
        assert_eq!(ctx.state(), Precondition::Init);
        assert_eq!(ctx.init(), HalStatus::Err);
        assert_eq!(ctx.state(), Precondition::Init);
        assert_eq!(ctx.uninit(), HalStatus::Ok);
        assert_eq!(ctx.state(), Precondition::NoInit);
    }

    #[test]
    fn test_restore_precondition() {
        let mut ctx = context();
        ctx.set_precondition(Precondition::InitWithConfig);
        ctx.restore_precondition().unwrap();
        assert_eq!(ctx.state(), Precondition::InitWithConfig);

        ctx.enter_uninitialized().unwrap();
        assert_eq!(ctx.state(), Precondition::NoInit);
        ctx.restore_precondition().unwrap();
        assert_eq!(ctx.state(), Precondition::InitWithConfig);

        ctx.set_precondition(Precondition::Init);
        ctx.restore_precondition().unwrap();
        assert_eq!(ctx.state(), Precondition::Init);
        ctx.shutdown();
        assert_eq!(ctx.state(), Precondition::NoInit);
    }

    #[test]
    fn test_restore_without_interface_fails() {
        let mut ctx = TestContext::new(Box::new(SimHal::new()), Fixtures::default());
        ctx.set_precondition(Precondition::InitWithConfig);
        let failure = ctx.restore_precondition().unwrap_err();
        assert_eq!(failure.message, "fixture value missing: interface");
    }

    #[test]
    fn test_event_capture_times_out() {
        let (callback, capture) = EventCapture::register();
        assert!(capture.wait(Duration::from_millis(10)).is_none());

        callback(0, "home", ConnectStatus::Connecting);
        callback(0, "home", ConnectStatus::Connected);
        let event = capture.wait_final(Duration::from_millis(100)).unwrap();
        assert_eq!(event.status, ConnectStatus::Connected);
    }
}
