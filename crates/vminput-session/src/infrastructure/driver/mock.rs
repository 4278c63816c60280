//! Mock driver/guest/status implementations for unit testing.
//!
//! Allows tests to drive the session state machines without OS hooks: the
//! mock records every grab/ungrab/push call and lets the test script grab
//! results and host lock state.  Same pattern as the hand-rolled recording
//! doubles in the application-layer tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use vminput_core::keymap::KeyTranslator;
use vminput_core::scancode::{KeyFlags, LedState, ScanCode};

use super::{DriverError, GuestKeyboard, InputDriver, LedDevice, StatusSink};
use crate::application::capture::ViewIndex;
use crate::application::handler::CaptureStatus;

/// A scriptable [`InputDriver`] that records all calls.
///
/// Key translation uses the real Windows VK table so tests can feed
/// realistic native codes.
pub struct MockDriver {
    inner: Mutex<MockDriverState>,
}

#[derive(Default)]
struct MockDriverState {
    /// Scripted results for upcoming `grab_keyboard` calls; when empty,
    /// grabs succeed.
    grab_results: VecDeque<bool>,
    grab_calls: Vec<ViewIndex>,
    ungrab_calls: Vec<ViewIndex>,
    host_lock_state: Option<LedState>,
    devices: Vec<LedDevice>,
    led_pushes: Vec<(LedDevice, LedState)>,
}

impl MockDriver {
    /// Creates a mock with one generic LED device and a known host lock
    /// state (all indicators off).
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockDriverState {
                host_lock_state: Some(LedState::default()),
                devices: vec![LedDevice {
                    vendor_id: 0x046D,
                    product_id: 0xC31C,
                    name: "mock keyboard".to_string(),
                }],
                ..MockDriverState::default()
            }),
        }
    }

    /// Scripts the results of the next `grab_keyboard` calls, in order.
    pub fn script_grab_results(&self, results: impl IntoIterator<Item = bool>) {
        self.inner
            .lock()
            .expect("lock poisoned")
            .grab_results
            .extend(results);
    }

    /// Replaces the reported host lock state (`None` = API unavailable).
    pub fn set_host_lock_state(&self, state: Option<LedState>) {
        self.inner.lock().expect("lock poisoned").host_lock_state = state;
    }

    /// Replaces the enumerated LED device list.
    pub fn set_devices(&self, devices: Vec<LedDevice>) {
        self.inner.lock().expect("lock poisoned").devices = devices;
    }

    /// Views passed to `grab_keyboard` so far.
    pub fn grab_calls(&self) -> Vec<ViewIndex> {
        self.inner.lock().expect("lock poisoned").grab_calls.clone()
    }

    /// Views passed to `ungrab_keyboard` so far.
    pub fn ungrab_calls(&self) -> Vec<ViewIndex> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .ungrab_calls
            .clone()
    }

    /// Every (device, state) pair pushed so far.
    pub fn led_pushes(&self) -> Vec<(LedDevice, LedState)> {
        self.inner.lock().expect("lock poisoned").led_pushes.clone()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDriver for MockDriver {
    fn translate_key(&self, native_code: u32) -> Option<(ScanCode, KeyFlags)> {
        KeyTranslator::windows_vk_to_set1(u8::try_from(native_code).ok()?)
    }

    fn grab_keyboard(&self, view: ViewIndex) -> bool {
        let mut state = self.inner.lock().expect("lock poisoned");
        state.grab_calls.push(view);
        state.grab_results.pop_front().unwrap_or(true)
    }

    fn ungrab_keyboard(&self, view: ViewIndex) {
        self.inner
            .lock()
            .expect("lock poisoned")
            .ungrab_calls
            .push(view);
    }

    fn query_host_lock_state(&self) -> Option<LedState> {
        self.inner.lock().expect("lock poisoned").host_lock_state
    }

    fn enumerate_led_devices(&self) -> Vec<LedDevice> {
        self.inner.lock().expect("lock poisoned").devices.clone()
    }

    fn push_lock_state(&self, device: &LedDevice, state: LedState) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.led_pushes.push((device.clone(), state));
        // Mirror the push so subsequent queries see the new state.
        if let Some(host) = inner.host_lock_state.as_mut() {
            *host = state;
        }
        Ok(())
    }
}

/// A [`GuestKeyboard`] that records every forwarded byte.
#[derive(Default)]
pub struct RecordingGuest {
    bytes: Mutex<Vec<u8>>,
}

impl RecordingGuest {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bytes forwarded so far, flattened in order.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().expect("lock poisoned").clone()
    }

    /// Clears the recording (between test phases).
    pub fn clear(&self) {
        self.bytes.lock().expect("lock poisoned").clear();
    }
}

impl GuestKeyboard for RecordingGuest {
    fn forward_scan_codes(&self, codes: &[u8]) {
        self.bytes
            .lock()
            .expect("lock poisoned")
            .extend_from_slice(codes);
    }
}

/// A [`StatusSink`] that records every notification.
#[derive(Default)]
pub struct RecordingStatus {
    statuses: Mutex<Vec<CaptureStatus>>,
    shortcuts: Mutex<Vec<char>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<CaptureStatus> {
        self.statuses.lock().expect("lock poisoned").clone()
    }

    pub fn shortcuts(&self) -> Vec<char> {
        self.shortcuts.lock().expect("lock poisoned").clone()
    }
}

impl StatusSink for RecordingStatus {
    fn capture_state_changed(&self, status: CaptureStatus) {
        self.statuses.lock().expect("lock poisoned").push(status);
    }

    fn host_shortcut(&self, symbol: char) {
        self.shortcuts.lock().expect("lock poisoned").push(symbol);
    }
}
