//! Per-session keyboard handler: the glue that owns every state machine.
//!
//! One [`KeyboardHandler`] exists per running VM session.  The platform
//! dispatch thread feeds it native key events, focus notifications,
//! machine power-state changes and timer firings; it owns the pressed-key
//! table, the combo detector, the capture state machine and the LED sync
//! policy, and talks to the outside world only through the four
//! infrastructure traits ([`InputDriver`], [`GuestKeyboard`],
//! [`StatusSink`], [`TaskScheduler`]).
//!
//! Nothing in here propagates an error upward.  Driver failures are
//! transient and handled in place; the worst observable outcome of a
//! persistently failing grab is a capture that never completes, which the
//! user escapes with the host combo or Ctrl+Alt+Del (see
//! `forward_regular_key`).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use vminput_core::scancode::{KeyFlags, LedState, ScanCode};
use vminput_core::scancode::stream::ScanCodeStream;

use super::capture::{CaptureState, CaptureStateMachine, FinalizeResult, ViewIndex};
use super::capture::CAPTURE_FINALIZE_DELAY;
use super::combo::{ComboOutcome, HostComboDetector, HostComboKeySet};
use super::keystate::{reconcile_lock_state, AdaptionCounter, PressedKeyTable};
use super::led_sync::LedSyncPolicy;
use crate::infrastructure::driver::{GuestKeyboard, InputDriver, StatusSink};
use crate::infrastructure::scheduler::{TaskScheduler, TimerEvent};

// ── Status flags ─────────────────────────────────────────────────────────

/// Capture status flags published to the UI layer on every transition.
///
/// A plain bit set (for beginners: the same newtype-over-`u8` pattern as
/// [`KeyFlags`]) so the status bar can render all indicators from one
/// value without chasing four booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStatus(pub u8);

impl CaptureStatus {
    /// The keyboard grab is held.
    pub const KEYBOARD_CAPTURED: u8 = 1 << 0;
    /// The pointer is captured alongside the keyboard (relative mode).
    pub const MOUSE_CAPTURED: u8 = 1 << 1;
    /// A capture request is pending its deferred finalize.
    pub const PENDING: u8 = 1 << 2;
    /// A host-combo gesture is in flight.
    pub const COMBO_HELD: u8 = 1 << 3;

    pub fn keyboard_captured(&self) -> bool {
        self.0 & Self::KEYBOARD_CAPTURED != 0
    }

    pub fn mouse_captured(&self) -> bool {
        self.0 & Self::MOUSE_CAPTURED != 0
    }

    pub fn pending(&self) -> bool {
        self.0 & Self::PENDING != 0
    }

    pub fn combo_held(&self) -> bool {
        self.0 & Self::COMBO_HELD != 0
    }
}

// ── Machine state ────────────────────────────────────────────────────────

/// Guest power state as reported by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Paused,
    /// Guest wedged (execution error); treated like a pause for input.
    Stuck,
}

// ── Options ──────────────────────────────────────────────────────────────

/// Per-session behavior knobs, resolved from the config file.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Capture the keyboard automatically when a view gains focus.
    pub auto_capture: bool,
    /// Forward Ctrl+Alt+Del to the guest instead of force-releasing.
    pub pass_ctrl_alt_del: bool,
    /// Deferral between a capture request and the grab attempt.
    pub capture_delay: Duration,
    /// Mirror guest lock state onto the host keyboard LEDs.
    pub led_sync: bool,
    /// Guest uses absolute pointer integration (no mouse grab needed).
    pub absolute_pointer: bool,
    /// Synthetic lock-toggle budget shared by reconciliation and LED sync.
    pub adaption_budget: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_capture: true,
            pass_ctrl_alt_del: false,
            capture_delay: CAPTURE_FINALIZE_DELAY,
            led_sync: true,
            absolute_pointer: true,
            adaption_budget: 16,
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────────

/// The per-session keyboard handler.
pub struct KeyboardHandler {
    session_id: Uuid,
    options: SessionOptions,

    keys: PressedKeyTable,
    combo: HostComboDetector,
    capture: CaptureStateMachine,
    led_sync: LedSyncPolicy,
    budget: AdaptionCounter,
    /// Last lock state the guest reported for itself.
    guest_leds: LedState,

    driver: Arc<dyn InputDriver>,
    guest: Arc<dyn GuestKeyboard>,
    status: Arc<dyn StatusSink>,
    scheduler: Arc<dyn TaskScheduler>,

    focused_view: Option<ViewIndex>,
    /// One-shot: suppresses auto-capture for the next focus-in only.
    auto_capture_disabled: bool,
    mouse_captured: bool,
    last_status: CaptureStatus,
    torn_down: bool,
}

impl KeyboardHandler {
    pub fn new(
        combo: HostComboKeySet,
        options: SessionOptions,
        driver: Arc<dyn InputDriver>,
        guest: Arc<dyn GuestKeyboard>,
        status: Arc<dyn StatusSink>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!(session = %session_id, ?options, "keyboard handler created");
        Self {
            session_id,
            capture: CaptureStateMachine::new(options.capture_delay),
            budget: AdaptionCounter::new(options.adaption_budget),
            options,
            keys: PressedKeyTable::new(),
            combo: HostComboDetector::new(combo),
            led_sync: LedSyncPolicy::new(),
            guest_leds: LedState::default(),
            driver,
            guest,
            status,
            scheduler,
            focused_view: None,
            auto_capture_disabled: false,
            mouse_captured: false,
            last_status: CaptureStatus::default(),
            torn_down: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    // ── Key events ───────────────────────────────────────────────────────

    /// Processes one native key event from the platform hook.
    ///
    /// Returns `true` when the event was consumed (swallowed or forwarded
    /// to the guest) and must not reach the host toolkit, `false` when the
    /// host should handle it normally.
    pub fn handle_native_key(&mut self, native_code: u32, pressed: bool) -> bool {
        if self.torn_down {
            return false;
        }
        let Some((code, flags)) = self.driver.translate_key(native_code) else {
            trace!(native_code, "unmapped native key, dropped");
            return true;
        };

        // Echo of our own LED push, not user input.
        if self.led_sync.consume_suppressed(code) {
            trace!(code = code.0, "suppressed synthetic lock-key echo");
            return true;
        }

        let captured = self.capture.is_captured();
        // Read before the transition clears the bit on release.
        let release_owed = !pressed && self.keys.was_pressed_captured(code);
        let changed = self
            .keys
            .record_key_transition(code, flags.extended(), pressed, captured);

        // A release with no matching press (key was down before the session
        // started) carries no information, except to the combo detector
        // when the key is a member.
        if !pressed && !changed && !self.combo.combo().contains(code, flags.extended()) {
            trace!(code = code.0, "release without matching press, dropped");
            return true;
        }

        let outcome = self.combo.on_key_event(code, flags, pressed, &self.keys);
        let consumed = match outcome {
            ComboOutcome::Forward => self.forward_regular_key(code, flags, pressed, release_owed),
            ComboOutcome::Swallow => true,
            ComboOutcome::ToggleCapture(releases) => {
                self.forward(&releases);
                self.toggle_capture();
                true
            }
            ComboOutcome::ComboEnded(releases) => {
                self.forward(&releases);
                true
            }
            ComboOutcome::HostShortcut(symbol) => {
                self.status.host_shortcut(symbol);
                true
            }
            ComboOutcome::ConsoleSwitch(stream) => {
                self.forward(&stream);
                true
            }
        };

        self.emit_status();
        consumed
    }

    /// Handles a key the combo detector passed through untouched.
    fn forward_regular_key(
        &mut self,
        code: ScanCode,
        flags: KeyFlags,
        pressed: bool,
        release_owed: bool,
    ) -> bool {
        // The escape hatch: Ctrl+Alt+Del held while passthrough is off
        // force-releases capture so the user can always regain the host,
        // even with a wedged guest or a grab gone wrong.
        if pressed && !self.options.pass_ctrl_alt_del && self.ctrl_alt_del_held() {
            warn!(session = %self.session_id, "Ctrl+Alt+Del with passthrough disabled, forcing release");
            self.release_keyboard(false);
            self.auto_capture_disabled = true;
            return true;
        }

        if !self.capture.is_captured() {
            return false;
        }
        // The press predates the capture; the guest never saw it, so it
        // must not see the release either.
        if !pressed && !release_owed {
            return true;
        }

        let mut stream = ScanCodeStream::new();
        stream.key_event(code, flags, pressed);
        self.forward(&stream);
        true
    }

    fn ctrl_alt_del_held(&self) -> bool {
        self.keys.is_pressed(ScanCode::LEFT_CTRL)
            && self.keys.is_pressed(ScanCode::LEFT_ALT)
            && self.keys.is_extended_pressed(ScanCode::DELETE)
    }

    // ── Capture transitions ──────────────────────────────────────────────

    fn toggle_capture(&mut self) {
        if self.capture.state() != CaptureState::Released {
            // Combo releases were already sent by the caller; keep the
            // combo keys out of the sweep so the guest sees each release
            // exactly once.
            self.release_keyboard(true);
        } else if let Some(view) = self.focused_view {
            self.capture.request_capture(view, &*self.scheduler);
        } else {
            debug!("capture toggle with no focused view, ignored");
        }
    }

    /// Releases keyboard (and mouse) capture and sweeps pressed keys.
    ///
    /// `keep_combo_keys` leaves host-combo members in the table: the
    /// toggle path has already released them to the guest, and the pause
    /// path wants a combo held across the pause to still resolve.
    fn release_keyboard(&mut self, keep_combo_keys: bool) {
        let was_captured = self.capture.is_captured();
        if !self.capture.release(&*self.driver) {
            return;
        }
        self.mouse_captured = false;

        let mut sweep = ScanCodeStream::new();
        if keep_combo_keys {
            self.keys.drain_releases_except(&mut sweep, self.combo.combo());
        } else {
            self.keys.drain_releases(&mut sweep);
            self.combo.reset();
        }
        if was_captured {
            self.forward(&sweep);
            if self.options.led_sync {
                self.led_sync.end_sync(&*self.driver);
            }
        }
        self.emit_status();
    }

    // ── Notifications ────────────────────────────────────────────────────

    /// A view gained input focus.
    ///
    /// The one-shot auto-capture suppression flag is consumed here whether
    /// or not auto-capture is globally enabled.
    pub fn notify_focus_in(&mut self, view: ViewIndex) {
        if self.torn_down {
            return;
        }
        self.focused_view = Some(view);
        let suppressed = std::mem::take(&mut self.auto_capture_disabled);
        if self.options.auto_capture && !suppressed {
            self.capture.request_capture(view, &*self.scheduler);
        }
        self.emit_status();
    }

    /// A view lost input focus.  Releases capture if that view held it.
    pub fn notify_focus_out(&mut self, view: ViewIndex) {
        if self.torn_down || self.focused_view != Some(view) {
            return;
        }
        self.focused_view = None;
        self.release_keyboard(false);
    }

    /// Suppresses auto-capture for the next focus-in only (the UI's
    /// explicit "release input" action sets this so the release sticks).
    pub fn disable_next_auto_capture(&mut self) {
        self.auto_capture_disabled = true;
    }

    /// Guest power-state change.
    pub fn notify_machine_state(&mut self, state: MachineState) {
        if self.torn_down {
            return;
        }
        match state {
            MachineState::Paused | MachineState::Stuck => {
                debug!(session = %self.session_id, ?state, "machine halted, releasing input");
                self.release_keyboard(true);
            }
            MachineState::Running => {
                if self.options.auto_capture && !self.auto_capture_disabled {
                    if let Some(view) = self.focused_view {
                        self.capture.request_capture(view, &*self.scheduler);
                    }
                }
            }
        }
        self.emit_status();
    }

    /// The guest updated its own lock-key state.
    pub fn notify_guest_leds(&mut self, leds: LedState) {
        if self.torn_down {
            return;
        }
        self.guest_leds = leds;
        if self.options.led_sync {
            self.led_sync
                .on_guest_leds_changed(&*self.driver, leds, &mut self.budget);
        }
    }

    /// Brings the guest's lock-key beliefs in line with the host's.
    ///
    /// Runs right after a successful grab: the user may have toggled
    /// NumLock or CapsLock while the guest was not listening.
    pub fn reconcile_guest_locks(&mut self) {
        let stream = reconcile_lock_state(
            &self.keys,
            &mut self.budget,
            self.guest_leds.num_lock,
            self.guest_leds.caps_lock,
            self.driver.query_host_lock_state(),
        );
        self.forward(&stream);
    }

    // ── Timers ───────────────────────────────────────────────────────────

    /// Processes a fired timer from the scheduler.
    pub fn handle_timer(&mut self, event: TimerEvent) {
        if self.torn_down {
            return;
        }
        match event {
            TimerEvent::FinalizeCapture { generation } => {
                let result =
                    self.capture
                        .handle_finalize(generation, &*self.driver, &*self.scheduler);
                if let FinalizeResult::Grabbed(view) = result {
                    debug!(session = %self.session_id, view, "capture finalized");
                    self.mouse_captured = !self.options.absolute_pointer;
                    if self.options.led_sync {
                        self.led_sync.begin_sync(&*self.driver);
                    }
                    self.reconcile_guest_locks();
                }
                self.emit_status();
            }
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Tears the session down: release capture, sweep keys, restore LEDs.
    ///
    /// Guarded: LED restoration can re-enter this path under nested
    /// dispatch, so the flag is checked and set before any work happens.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.release_keyboard(false);
        self.led_sync.end_sync(&*self.driver);
        self.torn_down = true;
        self.emit_status();
        info!(session = %self.session_id, "keyboard handler torn down");
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn forward(&self, stream: &ScanCodeStream) {
        if !stream.is_empty() {
            self.guest.forward_scan_codes(stream.as_bytes());
        }
    }

    fn current_status(&self) -> CaptureStatus {
        let mut bits = 0u8;
        match self.capture.state() {
            CaptureState::Captured(_) => bits |= CaptureStatus::KEYBOARD_CAPTURED,
            CaptureState::PendingCapture(_) => bits |= CaptureStatus::PENDING,
            CaptureState::Released => {}
        }
        if self.mouse_captured {
            bits |= CaptureStatus::MOUSE_CAPTURED;
        }
        if self.combo.gesture_active() {
            bits |= CaptureStatus::COMBO_HELD;
        }
        CaptureStatus(bits)
    }

    fn emit_status(&mut self) {
        let current = self.current_status();
        if current != self.last_status {
            self.last_status = current;
            self.status.capture_state_changed(current);
        }
    }
}

impl Drop for KeyboardHandler {
    fn drop(&mut self) {
        self.teardown();
    }
}
