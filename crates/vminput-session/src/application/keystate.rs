//! Pressed-key bookkeeping and bounded lock-state reconciliation.
//!
//! The [`PressedKeyTable`] is the session's single source of truth for
//! "which keys does the guest (or the host) currently believe are down".
//! It is mutated only by the keyboard handler on key-down/key-up and read
//! by combo detection and by the release-all cleanup sweeps.
//!
//! Invariant: a bit is set only between a matching press and its release.
//! A release for a key never marked pressed is a no-op at this level; the
//! handler still lets such releases through to the combo detector when the
//! code belongs to the host combo set, so combo bookkeeping stays correct
//! even when the press was swallowed by the OS.

use tracing::{debug, warn};
use vminput_core::scancode::stream::ScanCodeStream;
use vminput_core::scancode::{LedState, ScanCode};

use super::combo::HostComboKeySet;

/// Number of canonical scan-code slots (set-1 codes are 0–0x7F).
pub const KEY_SLOTS: usize = 128;

/// Per-slot state bits.
const PRESSED: u8 = 1 << 0;
const EXT_PRESSED: u8 = 1 << 1;
const CAPTURED_WHEN_PRESSED: u8 = 1 << 2;

/// Fixed-size table of per-key state bits, indexed by canonical scan code.
///
/// The plain and extended variants of a base code (e.g. Left Ctrl 1D and
/// Right Ctrl E0-1D) share a slot but track separate bits, mirroring how
/// the wire encoding distinguishes them only by the 0xE0 prefix.
#[derive(Debug, Clone)]
pub struct PressedKeyTable {
    slots: [u8; KEY_SLOTS],
}

/// A point-in-time copy of the table, taken when the host combo becomes
/// fully held and diffed against later state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressedKeySnapshot {
    slots: [u8; KEY_SLOTS],
}

impl Default for PressedKeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PressedKeyTable {
    /// Creates an empty table (no keys pressed).
    pub fn new() -> Self {
        Self {
            slots: [0; KEY_SLOTS],
        }
    }

    /// Records a key transition.  Returns `true` if the table changed.
    ///
    /// Press is idempotent (auto-repeat from the OS does not stack), and a
    /// release for a key not marked pressed returns `false` so the handler
    /// can drop the event.  `captured` tags a press that happened while the
    /// keyboard was captured; only those presses owe the guest a release.
    pub fn record_key_transition(
        &mut self,
        code: ScanCode,
        extended: bool,
        pressed: bool,
        captured: bool,
    ) -> bool {
        let bit = if extended { EXT_PRESSED } else { PRESSED };
        let slot = &mut self.slots[code.index()];
        if pressed {
            if *slot & bit != 0 {
                return false; // auto-repeat
            }
            *slot |= bit;
            if captured {
                *slot |= CAPTURED_WHEN_PRESSED;
            }
            true
        } else {
            if *slot & bit == 0 {
                return false; // release without a matching press
            }
            *slot &= !bit;
            if *slot & (PRESSED | EXT_PRESSED) == 0 {
                *slot &= !CAPTURED_WHEN_PRESSED;
            }
            true
        }
    }

    /// Returns `true` if the plain or extended variant of `code` is down.
    pub fn is_pressed(&self, code: ScanCode) -> bool {
        self.slots[code.index()] & (PRESSED | EXT_PRESSED) != 0
    }

    /// Returns `true` if specifically the extended variant of `code` is down.
    pub fn is_extended_pressed(&self, code: ScanCode) -> bool {
        self.slots[code.index()] & EXT_PRESSED != 0
    }

    /// Returns `true` if the press of `code` happened while captured.
    pub fn was_pressed_captured(&self, code: ScanCode) -> bool {
        self.slots[code.index()] & CAPTURED_WHEN_PRESSED != 0
    }

    /// Returns `true` if either Shift is currently down.
    pub fn shift_held(&self) -> bool {
        self.is_pressed(ScanCode::LEFT_SHIFT) || self.is_pressed(ScanCode::RIGHT_SHIFT)
    }

    /// Returns `true` if any key outside `combo` is currently down.
    pub fn any_non_combo_pressed(&self, combo: &HostComboKeySet) -> bool {
        self.iter_pressed()
            .any(|(code, extended)| !combo.contains(code, extended))
    }

    /// Iterates over every (code, extended) pair currently marked pressed,
    /// in ascending scan-code order with the plain variant first.
    pub fn iter_pressed(&self) -> impl Iterator<Item = (ScanCode, bool)> + '_ {
        self.slots.iter().enumerate().flat_map(|(idx, &bits)| {
            let code = ScanCode(idx as u8);
            let plain = (bits & PRESSED != 0).then_some((code, false));
            let ext = (bits & EXT_PRESSED != 0).then_some((code, true));
            plain.into_iter().chain(ext)
        })
    }

    /// Takes a snapshot of the current table for later diffing.
    pub fn snapshot(&self) -> PressedKeySnapshot {
        PressedKeySnapshot { slots: self.slots }
    }

    /// Emits exactly one release per set bit into `stream` and clears the
    /// table.  This is the "release all pressed keys" cleanup that prevents
    /// stuck keys in the guest after a capture release.
    pub fn drain_releases(&mut self, stream: &mut ScanCodeStream) {
        self.drain_releases_filtered(stream, |_, _| true);
    }

    /// Like [`drain_releases`](Self::drain_releases), but leaves the host
    /// combo keys in place.  Used on machine pause so a combo held across
    /// the pause still resolves when the machine resumes.
    pub fn drain_releases_except(&mut self, stream: &mut ScanCodeStream, combo: &HostComboKeySet) {
        self.drain_releases_filtered(stream, |code, extended| !combo.contains(code, extended));
    }

    fn drain_releases_filtered(
        &mut self,
        stream: &mut ScanCodeStream,
        mut include: impl FnMut(ScanCode, bool) -> bool,
    ) {
        for idx in 0..KEY_SLOTS {
            let code = ScanCode(idx as u8);
            if self.slots[idx] & PRESSED != 0 && include(code, false) {
                stream.release(code, false);
                self.slots[idx] &= !PRESSED;
            }
            if self.slots[idx] & EXT_PRESSED != 0 && include(code, true) {
                stream.release(code, true);
                self.slots[idx] &= !EXT_PRESSED;
            }
            if self.slots[idx] & (PRESSED | EXT_PRESSED) == 0 {
                self.slots[idx] &= !CAPTURED_WHEN_PRESSED;
            }
        }
    }
}

impl PressedKeySnapshot {
    /// Returns the (code, extended) pairs pressed in `current` but not in
    /// this snapshot.
    pub fn newly_pressed_in<'a>(
        &'a self,
        current: &'a PressedKeyTable,
    ) -> impl Iterator<Item = (ScanCode, bool)> + 'a {
        current.iter_pressed().filter(|&(code, extended)| {
            let bit = if extended { EXT_PRESSED } else { PRESSED };
            self.slots[code.index()] & bit == 0
        })
    }
}

// ── Lock-state reconciliation ─────────────────────────────────────────────────

/// Bounded budget for synthetic lock-key toggles.
///
/// A persistent host/guest mismatch (e.g. a guest that force-holds CapsLock)
/// would otherwise make reconciliation loop forever; the counter caps the
/// number of correction attempts per session.
#[derive(Debug, Clone, Copy)]
pub struct AdaptionCounter {
    remaining: u8,
}

impl AdaptionCounter {
    /// Creates a counter with `budget` correction attempts.
    pub fn new(budget: u8) -> Self {
        Self { remaining: budget }
    }

    /// Consumes one unit; returns `false` when the budget is exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Remaining correction attempts.
    pub fn remaining(&self) -> u8 {
        self.remaining
    }
}

/// Synthesizes the scan-code sequence that brings the guest's NumLock and
/// CapsLock beliefs in line with the host's OS-reported state.
///
/// Returns an empty stream (and consumes no budget) when the host state is
/// unavailable, when nothing differs, or when the budget is exhausted.
/// CapsLock correction appends a Shift tap when Shift is unheld, because
/// some layouts only clear CapsLock while Shift is down.
pub fn reconcile_lock_state(
    table: &PressedKeyTable,
    budget: &mut AdaptionCounter,
    guest_num_lock: bool,
    guest_caps_lock: bool,
    host: Option<LedState>,
) -> ScanCodeStream {
    let mut stream = ScanCodeStream::new();

    // Platform cannot report lock state: silently degrade.
    let Some(host) = host else {
        debug!("host lock state unavailable, skipping reconciliation");
        return stream;
    };

    let num_differs = guest_num_lock != host.num_lock;
    let caps_differs = guest_caps_lock != host.caps_lock;
    if !num_differs && !caps_differs {
        return stream;
    }

    if !budget.try_consume() {
        warn!("lock-state adaption budget exhausted, leaving mismatch in place");
        return stream;
    }

    if num_differs {
        stream.tap(ScanCode::NUM_LOCK, false);
    }
    if caps_differs {
        stream.tap(ScanCode::CAPS_LOCK, false);
        if !table.shift_held() {
            stream.tap(ScanCode::LEFT_SHIFT, false);
        }
    }
    debug!(
        remaining = budget.remaining(),
        num = num_differs,
        caps = caps_differs,
        "synthesized lock-state correction"
    );
    stream
}
