//! Canonical set-1 scan codes and per-key flag bits.
//!
//! The canonical key representation throughout VM-Input is the legacy PC
//! "set 1" keyboard scan code: a value in 0–0x7F, optionally marked
//! *extended* (the keys a PC/AT keyboard prefixes with 0xE0 on the wire,
//! such as the right-hand modifiers, the navigation block, and numpad
//! Enter).  The guest's virtual keyboard device consumes this encoding
//! verbatim, so every table in this workspace must be bit-exact with set 1.
//!
//! # Why set 1 and not something nicer? (for beginners)
//!
//! The very first IBM PC keyboard spoke "scan code set 1", and because every
//! later keyboard controller kept a compatibility mode for it, it is still
//! the encoding a virtualized i8042 keyboard controller expects from its
//! "hardware".  A VM console therefore has no choice in the matter: whatever
//! the host OS reports (Windows VK codes, X11 keycodes, macOS CGKeyCodes)
//! must be translated back into set 1 before it reaches the guest.

pub mod stream;

use serde::{Deserialize, Serialize};

/// A canonical set-1 scan code in the range 0–0x7F.
///
/// The value 0 means "unmapped" and is never forwarded to the guest; the
/// translation tables in [`crate::keymap`] return `None` instead of
/// producing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanCode(pub u8);

impl ScanCode {
    // Modifiers.  LEFT_CTRL and RIGHT_CTRL share the base code 0x1D; the
    // right-hand variant is distinguished by the extended flag, mirroring
    // the 0xE0 prefix on the wire.  Same for Alt (0x38).
    pub const LEFT_CTRL: ScanCode = ScanCode(0x1D);
    pub const RIGHT_CTRL: ScanCode = ScanCode(0x1D);
    pub const LEFT_SHIFT: ScanCode = ScanCode(0x2A);
    pub const RIGHT_SHIFT: ScanCode = ScanCode(0x36);
    pub const LEFT_ALT: ScanCode = ScanCode(0x38);
    pub const RIGHT_ALT: ScanCode = ScanCode(0x38);
    pub const LEFT_META: ScanCode = ScanCode(0x5B);
    pub const RIGHT_META: ScanCode = ScanCode(0x5C);

    // Lock keys.
    pub const CAPS_LOCK: ScanCode = ScanCode(0x3A);
    pub const NUM_LOCK: ScanCode = ScanCode(0x45);
    pub const SCROLL_LOCK: ScanCode = ScanCode(0x46);

    // Keys the session logic references by name.
    pub const ESCAPE: ScanCode = ScanCode(0x01);
    pub const ENTER: ScanCode = ScanCode(0x1C);
    pub const SPACE: ScanCode = ScanCode(0x39);
    pub const DELETE: ScanCode = ScanCode(0x53); // extended on the wire
    pub const INSERT: ScanCode = ScanCode(0x52); // extended on the wire
    // Set 1 places F1–F10 contiguously but parks F11/F12 past the numpad
    // block, so the two helpers below cannot use a single range.
    pub const F1: ScanCode = ScanCode(0x3B);
    pub const F10: ScanCode = ScanCode(0x44);
    pub const F11: ScanCode = ScanCode(0x57);
    pub const F12: ScanCode = ScanCode(0x58);

    /// Returns the slot index for a 128-entry per-key table.
    pub fn index(self) -> usize {
        (self.0 & 0x7F) as usize
    }

    /// Returns `true` if this code is one of the three keyboard lock keys.
    pub fn is_lock_key(self) -> bool {
        matches!(self, Self::CAPS_LOCK | Self::NUM_LOCK | Self::SCROLL_LOCK)
    }

    /// Returns `Some(0..=11)` if this is F1–F12, else `None`.
    pub fn function_key_index(self) -> Option<u8> {
        match self.0 {
            c if (Self::F1.0..=Self::F10.0).contains(&c) => Some(c - Self::F1.0),
            c if c == Self::F11.0 => Some(10),
            c if c == Self::F12.0 => Some(11),
            _ => None,
        }
    }

    /// Returns the F-key scan code for `index` (0 = F1 … 11 = F12).
    ///
    /// Inverse of [`Self::function_key_index`]; out-of-range indices wrap.
    pub fn function_key(index: u8) -> ScanCode {
        match index % 12 {
            10 => Self::F11,
            11 => Self::F12,
            i => ScanCode(Self::F1.0 + i),
        }
    }
}

/// Per-key flag bits attached to a canonical scan code by the translation
/// tables.
///
/// `EXTENDED` marks keys that carry the 0xE0 wire prefix.  `MODIFIER` and
/// `LOCK` classify the key for the capture logic: modifiers never demote a
/// held host combo on their own (they might *be* the combo), lock keys
/// participate in LED synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyFlags(pub u8);

impl KeyFlags {
    pub const EXTENDED: u8 = 1 << 0;
    pub const MODIFIER: u8 = 1 << 1;
    pub const LOCK: u8 = 1 << 2;

    /// Returns `true` if the key carries the 0xE0 wire prefix.
    pub fn extended(&self) -> bool {
        self.0 & Self::EXTENDED != 0
    }

    /// Returns `true` if the key is a modifier (Ctrl/Shift/Alt/Meta).
    pub fn modifier(&self) -> bool {
        self.0 & Self::MODIFIER != 0
    }

    /// Returns `true` if the key is NumLock, CapsLock, or ScrollLock.
    pub fn lock(&self) -> bool {
        self.0 & Self::LOCK != 0
    }
}

/// Host lock-key indicator snapshot (NumLock / CapsLock / ScrollLock).
///
/// Two lifetimes exist in the session logic: the snapshot taken when LED
/// synchronization begins (the restore point) and the transient "desired"
/// triple pushed to host devices whenever the guest's lock state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedState {
    pub num_lock: bool,
    pub caps_lock: bool,
    pub scroll_lock: bool,
}
