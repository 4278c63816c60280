//! Host indicator LED synchronization.
//!
//! When synchronization is active, the host's NumLock/CapsLock/ScrollLock
//! indicator lights follow the guest's keyboard-lock state: the guest is
//! the authority while it owns the keyboard.  The host's own state is
//! captured once when sync begins and restored when it ends, so leaving
//! the VM puts your keyboard lights back the way they were.
//!
//! Pushing LEDs makes the OS synthesize lock-key events on some platforms;
//! the policy arms a suppression window so the handler ignores exactly
//! those echoes instead of re-notifying the guest in a feedback loop.
//!
//! A small deny list excludes keyboard models known to freeze when their
//! LEDs are programmatically toggled; for those, sync logs and moves on.

use tracing::{debug, info, warn};
use vminput_core::scancode::{LedState, ScanCode};

use super::keystate::AdaptionCounter;
use crate::infrastructure::driver::{InputDriver, LedDevice};

/// Vendor/product IDs of devices whose firmware hangs on programmatic LED
/// writes.  Grown from bug reports; keep sorted by vendor.
const LED_DENY_LIST: &[(u16, u16)] = &[
    (0x045E, 0x0745), // older wireless receiver, drops keys after LED write
    (0x1532, 0x010D), // gaming keyboard, firmware lockup on LED toggle
];

fn is_denied(device: &LedDevice) -> bool {
    LED_DENY_LIST
        .iter()
        .any(|&(v, p)| v == device.vendor_id && p == device.product_id)
}

/// The per-session LED synchronization policy.
#[derive(Debug, Default)]
pub struct LedSyncPolicy {
    active: bool,
    /// Host state captured at `begin_sync`; the restore point.
    snapshot: Option<LedState>,
    /// Number of synthetic lock-key events still expected from the last
    /// push; the handler swallows lock-key events while this is non-zero.
    suppressed_events: u8,
}

impl LedSyncPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` between `begin_sync` and `end_sync`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Starts synchronization, capturing the host state once as the
    /// restore point.  Calling again while active is a no-op.
    pub fn begin_sync(&mut self, driver: &dyn InputDriver) {
        if self.active {
            return;
        }
        self.snapshot = driver.query_host_lock_state();
        if self.snapshot.is_none() {
            debug!("host lock state unavailable, LED sync will push blind");
        }
        self.active = true;
        info!(snapshot = ?self.snapshot, "LED sync started");
    }

    /// Pushes the guest's lock state to the host devices if it differs
    /// from what the host currently shows.
    ///
    /// Consumes one adaption unit per push so a device that refuses to
    /// latch the state cannot drive an endless correction loop.
    pub fn on_guest_leds_changed(
        &mut self,
        driver: &dyn InputDriver,
        guest: LedState,
        budget: &mut AdaptionCounter,
    ) {
        if !self.active {
            return;
        }
        // Unknown host state: assume a difference and push.
        if driver.query_host_lock_state() == Some(guest) {
            return;
        }
        if !budget.try_consume() {
            warn!("LED adaption budget exhausted, leaving host indicators as-is");
            return;
        }
        self.push_to_devices(driver, guest);
        debug!(?guest, remaining = budget.remaining(), "pushed guest lock state to host");
    }

    /// Ends synchronization, restoring the captured host snapshot.
    ///
    /// Idempotent: the host dispatch loop can nest callbacks during
    /// teardown, so a second call must be (and is) a no-op.
    pub fn end_sync(&mut self, driver: &dyn InputDriver) {
        if !self.active {
            return;
        }
        // Mark torn down before touching the driver; a re-entrant call
        // from a nested dispatch then returns immediately above.
        self.active = false;
        if let Some(snapshot) = self.snapshot.take() {
            self.push_to_devices(driver, snapshot);
            info!(?snapshot, "LED sync ended, host state restored");
        } else {
            info!("LED sync ended (no snapshot to restore)");
        }
    }

    /// Consumes one suppressed synthetic lock-key event.
    ///
    /// Returns `true` if the handler should swallow the event (it is an
    /// echo of our own LED push, not user input).
    pub fn consume_suppressed(&mut self, code: ScanCode) -> bool {
        if self.suppressed_events == 0 || !code.is_lock_key() {
            return false;
        }
        self.suppressed_events -= 1;
        true
    }

    fn push_to_devices(&mut self, driver: &dyn InputDriver, state: LedState) {
        let before = driver.query_host_lock_state();

        // Each lock key whose state flips will echo one press+release pair.
        if let Some(before) = before {
            let mut flips = 0u8;
            if before.num_lock != state.num_lock {
                flips += 1;
            }
            if before.caps_lock != state.caps_lock {
                flips += 1;
            }
            if before.scroll_lock != state.scroll_lock {
                flips += 1;
            }
            self.suppressed_events = self.suppressed_events.saturating_add(flips * 2);
        }

        for device in driver.enumerate_led_devices() {
            if is_denied(&device) {
                debug!(
                    vendor = format_args!("{:04x}", device.vendor_id),
                    product = format_args!("{:04x}", device.product_id),
                    name = %device.name,
                    "device on LED deny list, skipping"
                );
                continue;
            }
            if let Err(err) = driver.push_lock_state(&device, state) {
                // Fire-and-forget contract: log and continue.
                warn!(name = %device.name, %err, "LED push failed");
            }
        }
    }
}
