//! X11 keycode → canonical set-1 translation table.
//!
//! Reference: linux/input-event-codes.h and the X11 core protocol.  Under
//! every modern X server the keycode reported for a key is the Linux evdev
//! code plus 8.
//!
//! # Why the base block is an identity mapping (for beginners)
//!
//! The Linux evdev key numbering was deliberately chosen so that the
//! original PC/AT block (ESC=1 through F12=88) is *numerically identical*
//! to scan-code set 1.  Only the keys that set 1 encodes with an 0xE0
//! prefix (right-hand modifiers, navigation block, numpad Enter/divide)
//! got fresh evdev numbers above 88, so those are the only entries that
//! need explicit remapping below.

use super::{entry, unpack};
use crate::scancode::{KeyFlags, ScanCode};

/// X11 keycode = evdev code + this offset.
const EVDEV_OFFSET: usize = 8;

/// Translates an X11 keycode to a canonical set-1 code.
///
/// Returns `None` for keycodes with no set-1 equivalent (multimedia keys,
/// codes below the evdev offset).
pub fn keycode_to_set1(keycode: u8) -> Option<(ScanCode, KeyFlags)> {
    unpack(X11_TO_SET1_TABLE[keycode as usize])
}

const EXT: u8 = KeyFlags::EXTENDED;
const MOD: u8 = KeyFlags::MODIFIER;
const LOCK: u8 = KeyFlags::LOCK;

/// Complete X11 keycode → set-1 mapping table indexed by keycode (0–255).
const X11_TO_SET1_TABLE: [u16; 256] = {
    let mut t = [0u16; 256];

    // ── Base block: evdev 1–88 is set 1 verbatim ─────────────────────────────
    let mut ev = 1usize;
    while ev <= 88 {
        t[ev + EVDEV_OFFSET] = entry(ev as u8, 0);
        ev += 1;
    }

    // Flag fix-ups inside the base block.
    t[29 + EVDEV_OFFSET] = entry(0x1D, MOD); // KEY_LEFTCTRL
    t[42 + EVDEV_OFFSET] = entry(0x2A, MOD); // KEY_LEFTSHIFT
    t[54 + EVDEV_OFFSET] = entry(0x36, MOD); // KEY_RIGHTSHIFT
    t[56 + EVDEV_OFFSET] = entry(0x38, MOD); // KEY_LEFTALT
    t[58 + EVDEV_OFFSET] = entry(0x3A, LOCK); // KEY_CAPSLOCK
    t[69 + EVDEV_OFFSET] = entry(0x45, LOCK); // KEY_NUMLOCK
    t[70 + EVDEV_OFFSET] = entry(0x46, LOCK); // KEY_SCROLLLOCK

    // ── 0xE0-class keys (fresh evdev numbers above the base block) ───────────
    t[96 + EVDEV_OFFSET] = entry(0x1C, EXT); // KEY_KPENTER
    t[97 + EVDEV_OFFSET] = entry(0x1D, MOD | EXT); // KEY_RIGHTCTRL
    t[98 + EVDEV_OFFSET] = entry(0x35, EXT); // KEY_KPSLASH
    t[99 + EVDEV_OFFSET] = entry(0x37, EXT); // KEY_SYSRQ (PrintScreen)
    t[100 + EVDEV_OFFSET] = entry(0x38, MOD | EXT); // KEY_RIGHTALT
    t[102 + EVDEV_OFFSET] = entry(0x47, EXT); // KEY_HOME
    t[103 + EVDEV_OFFSET] = entry(0x48, EXT); // KEY_UP
    t[104 + EVDEV_OFFSET] = entry(0x49, EXT); // KEY_PAGEUP
    t[105 + EVDEV_OFFSET] = entry(0x4B, EXT); // KEY_LEFT
    t[106 + EVDEV_OFFSET] = entry(0x4D, EXT); // KEY_RIGHT
    t[107 + EVDEV_OFFSET] = entry(0x4F, EXT); // KEY_END
    t[108 + EVDEV_OFFSET] = entry(0x50, EXT); // KEY_DOWN
    t[109 + EVDEV_OFFSET] = entry(0x51, EXT); // KEY_PAGEDOWN
    t[110 + EVDEV_OFFSET] = entry(0x52, EXT); // KEY_INSERT
    t[111 + EVDEV_OFFSET] = entry(0x53, EXT); // KEY_DELETE
    // KEY_PAUSE (119) has an E1-prefixed make code in set 1 and stays
    // unmapped, matching the Windows table.
    t[125 + EVDEV_OFFSET] = entry(0x5B, MOD | EXT); // KEY_LEFTMETA
    t[126 + EVDEV_OFFSET] = entry(0x5C, MOD | EXT); // KEY_RIGHTMETA
    t[127 + EVDEV_OFFSET] = entry(0x5D, EXT); // KEY_COMPOSE (Menu)

    t
};
