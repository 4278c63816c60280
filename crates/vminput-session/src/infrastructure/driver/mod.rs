//! Input-driver boundary between the session logic and the host OS.
//!
//! Each platform ships one backend behind [`InputDriver`]: a Cocoa event
//! tap on macOS, a WH_KEYBOARD_LL hook on Windows, an XCB grab on X11.
//! The state machines in the application layer depend only on this trait,
//! never on a concrete backend, which is also what makes them fully
//! unit-testable — see [`mock::MockDriver`].
//!
//! # Contract notes
//!
//! - `translate_key` is a pure table lookup; `None` means "unmapped",
//!   which callers treat as "ignore this event".
//! - `grab_keyboard` may fail transiently (a competing grab holds the
//!   resource); the capture state machine retries, it never treats a
//!   failed grab as fatal.
//! - `query_host_lock_state` returns `None` on platforms without a lock
//!   query API; LED reconciliation silently degrades.
//! - `push_lock_state` is fire-and-forget; failures are logged only.

pub mod mock;

use thiserror::Error;
use vminput_core::scancode::{KeyFlags, LedState, ScanCode};

use crate::application::capture::ViewIndex;

/// Error type for driver operations that can fail.
///
/// Everything here is transient by design; nothing propagates past the
/// session handler.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("keyboard device rejected LED update: {0}")]
    LedPushFailed(String),
    #[error("platform API unavailable: {0}")]
    Unavailable(String),
}

/// A host keyboard device as enumerated for LED synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
}

/// Trait abstracting the OS-specific input backend.
///
/// All methods are synchronous: the session subsystem is a single-threaded
/// reactive loop driven from the platform's event dispatch thread.
pub trait InputDriver: Send + Sync {
    /// Translates a native key identifier (VK code, X11 keycode, CGKeyCode)
    /// to a canonical set-1 code.  `None` = unmapped, drop the event.
    fn translate_key(&self, native_code: u32) -> Option<(ScanCode, KeyFlags)>;

    /// Attempts the OS keyboard grab for the given view.
    ///
    /// Returns `false` when the grab is transiently unavailable; the
    /// caller retries.
    fn grab_keyboard(&self, view: ViewIndex) -> bool;

    /// Releases the OS keyboard grab.  Best-effort, always succeeds.
    fn ungrab_keyboard(&self, view: ViewIndex);

    /// Reports the host's current lock-key state, or `None` when the
    /// platform has no API for it.
    fn query_host_lock_state(&self) -> Option<LedState>;

    /// Enumerates host keyboard devices with controllable indicator LEDs.
    fn enumerate_led_devices(&self) -> Vec<LedDevice>;

    /// Pushes a lock-key state to one host device's indicator LEDs.
    fn push_lock_state(&self, device: &LedDevice, state: LedState) -> Result<(), DriverError>;
}

/// Trait for the guest-facing virtual keyboard device.
///
/// The byte sequence is the set-1 encoding produced by
/// [`vminput_core::scancode::stream::ScanCodeStream`]; the receiving
/// virtual keyboard consumes it verbatim.
pub trait GuestKeyboard: Send + Sync {
    /// Forwards an ordered scan-code byte sequence to the guest.
    fn forward_scan_codes(&self, codes: &[u8]);
}

/// Trait for publishing capture/combo state transitions to the UI layer
/// (window title indicators, status-bar icons).
pub trait StatusSink: Send + Sync {
    /// Emitted on every capture or combo state transition.
    fn capture_state_changed(&self, status: crate::application::handler::CaptureStatus);

    /// Emitted when combo + alphanumeric resolves to a host action.
    fn host_shortcut(&self, symbol: char);
}
