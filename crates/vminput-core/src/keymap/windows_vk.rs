//! Windows Virtual Key (VK) code → canonical set-1 translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h) and the IBM PC/AT
//! scan-code set 1 layout.  Windows VK codes range from 0x00 to 0xFF.
//!
//! # How this table works
//!
//! `VK_TO_SET1_TABLE` is a compile-time constant array of 256 packed
//! entries, indexed by VK code.  Position 0x41 holds set-1 0x1E because
//! Windows VK_A is 0x41 and the A key sits at 0x1E on a set-1 keyboard.
//! Any VK code without a set-1 equivalent stores the unmapped sentinel 0.
//!
//! Indexing into this array is an O(1) lookup, which matters because every
//! key event captured by the low-level hook goes through this table.
//!
//! The generic VK_SHIFT/VK_CONTROL/VK_MENU codes (0x10–0x12) resolve to the
//! *left-hand* set-1 code; a hook that distinguishes sides reports the
//! L*/R* variants (0xA0–0xA5) instead and gets the side-accurate mapping.

use super::{entry, unpack};
use crate::scancode::{KeyFlags, ScanCode};

/// Translates a Windows Virtual Key code to a canonical set-1 code.
///
/// Returns `None` for VK codes that have no set-1 equivalent (mouse button
/// VKs, browser/media keys, undefined ranges).
pub fn vk_to_set1(vk: u8) -> Option<(ScanCode, KeyFlags)> {
    unpack(VK_TO_SET1_TABLE[vk as usize])
}

/// Translates a canonical set-1 code back to a Windows Virtual Key code.
///
/// Returns `None` for set-1 codes with no VK equivalent.  The generic
/// modifier VKs (0x10–0x12) are skipped in favour of the side-specific
/// variants so the reverse direction is unambiguous.
pub fn set1_to_vk(code: ScanCode, extended: bool) -> Option<u8> {
    // Linear scan is acceptable for the infrequent reverse direction.
    for (vk, &raw) in VK_TO_SET1_TABLE.iter().enumerate() {
        if (0x10..=0x12).contains(&vk) {
            continue;
        }
        if let Some((mapped, flags)) = unpack(raw) {
            if mapped == code && flags.extended() == extended {
                return Some(vk as u8);
            }
        }
    }
    None
}

const EXT: u8 = KeyFlags::EXTENDED;
const MOD: u8 = KeyFlags::MODIFIER;
const LOCK: u8 = KeyFlags::LOCK;

/// Complete VK → set-1 mapping table indexed by VK code (0x00–0xFF).
///
/// Entries are 0 (unmapped) when no set-1 equivalent exists.
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_TO_SET1_TABLE: [u16; 256] = {
    let mut t = [0u16; 256];

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = entry(0x1E, 0); // A
    t[0x42] = entry(0x30, 0); // B
    t[0x43] = entry(0x2E, 0); // C
    t[0x44] = entry(0x20, 0); // D
    t[0x45] = entry(0x12, 0); // E
    t[0x46] = entry(0x21, 0); // F
    t[0x47] = entry(0x22, 0); // G
    t[0x48] = entry(0x23, 0); // H
    t[0x49] = entry(0x17, 0); // I
    t[0x4A] = entry(0x24, 0); // J
    t[0x4B] = entry(0x25, 0); // K
    t[0x4C] = entry(0x26, 0); // L
    t[0x4D] = entry(0x32, 0); // M
    t[0x4E] = entry(0x31, 0); // N
    t[0x4F] = entry(0x18, 0); // O
    t[0x50] = entry(0x19, 0); // P
    t[0x51] = entry(0x10, 0); // Q
    t[0x52] = entry(0x13, 0); // R
    t[0x53] = entry(0x1F, 0); // S
    t[0x54] = entry(0x14, 0); // T
    t[0x55] = entry(0x16, 0); // U
    t[0x56] = entry(0x2F, 0); // V
    t[0x57] = entry(0x11, 0); // W
    t[0x58] = entry(0x2D, 0); // X
    t[0x59] = entry(0x15, 0); // Y
    t[0x5A] = entry(0x2C, 0); // Z

    // ── Digit row (VK_0=0x30 … VK_9=0x39) ────────────────────────────────────
    t[0x30] = entry(0x0B, 0);
    t[0x31] = entry(0x02, 0);
    t[0x32] = entry(0x03, 0);
    t[0x33] = entry(0x04, 0);
    t[0x34] = entry(0x05, 0);
    t[0x35] = entry(0x06, 0);
    t[0x36] = entry(0x07, 0);
    t[0x37] = entry(0x08, 0);
    t[0x38] = entry(0x09, 0);
    t[0x39] = entry(0x0A, 0);

    // ── Control keys ─────────────────────────────────────────────────────────
    t[0x08] = entry(0x0E, 0); // VK_BACK
    t[0x09] = entry(0x0F, 0); // VK_TAB
    t[0x0D] = entry(0x1C, 0); // VK_RETURN
    t[0x1B] = entry(0x01, 0); // VK_ESCAPE
    t[0x20] = entry(0x39, 0); // VK_SPACE
    t[0x14] = entry(0x3A, LOCK); // VK_CAPITAL
    t[0x90] = entry(0x45, LOCK); // VK_NUMLOCK
    t[0x91] = entry(0x46, LOCK); // VK_SCROLL
    // VK_PAUSE (0x13) is the one key with an E1-prefixed make code in set 1;
    // it is not representable in the canonical range and stays unmapped.
    t[0x2C] = entry(0x37, EXT); // VK_SNAPSHOT
    t[0x2D] = entry(0x52, EXT); // VK_INSERT
    t[0x24] = entry(0x47, EXT); // VK_HOME
    t[0x21] = entry(0x49, EXT); // VK_PRIOR (PageUp)
    t[0x2E] = entry(0x53, EXT); // VK_DELETE
    t[0x23] = entry(0x4F, EXT); // VK_END
    t[0x22] = entry(0x51, EXT); // VK_NEXT (PageDown)
    t[0x5D] = entry(0x5D, EXT); // VK_APPS

    // ── Arrow keys ───────────────────────────────────────────────────────────
    t[0x25] = entry(0x4B, EXT); // VK_LEFT
    t[0x26] = entry(0x48, EXT); // VK_UP
    t[0x27] = entry(0x4D, EXT); // VK_RIGHT
    t[0x28] = entry(0x50, EXT); // VK_DOWN

    // ── Modifier keys ────────────────────────────────────────────────────────
    t[0x10] = entry(0x2A, MOD); // VK_SHIFT (generic → left)
    t[0x11] = entry(0x1D, MOD); // VK_CONTROL (generic → left)
    t[0x12] = entry(0x38, MOD); // VK_MENU (generic → left)
    t[0xA0] = entry(0x2A, MOD); // VK_LSHIFT
    t[0xA1] = entry(0x36, MOD); // VK_RSHIFT
    t[0xA2] = entry(0x1D, MOD); // VK_LCONTROL
    t[0xA3] = entry(0x1D, MOD | EXT); // VK_RCONTROL
    t[0xA4] = entry(0x38, MOD); // VK_LMENU
    t[0xA5] = entry(0x38, MOD | EXT); // VK_RMENU
    t[0x5B] = entry(0x5B, MOD | EXT); // VK_LWIN
    t[0x5C] = entry(0x5C, MOD | EXT); // VK_RWIN

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    t[0x70] = entry(0x3B, 0);
    t[0x71] = entry(0x3C, 0);
    t[0x72] = entry(0x3D, 0);
    t[0x73] = entry(0x3E, 0);
    t[0x74] = entry(0x3F, 0);
    t[0x75] = entry(0x40, 0);
    t[0x76] = entry(0x41, 0);
    t[0x77] = entry(0x42, 0);
    t[0x78] = entry(0x43, 0);
    t[0x79] = entry(0x44, 0);
    t[0x7A] = entry(0x57, 0);
    t[0x7B] = entry(0x58, 0);

    // ── OEM punctuation (US layout positions) ────────────────────────────────
    t[0xBA] = entry(0x27, 0); // VK_OEM_1      ;:
    t[0xBB] = entry(0x0D, 0); // VK_OEM_PLUS   =+
    t[0xBC] = entry(0x33, 0); // VK_OEM_COMMA  ,<
    t[0xBD] = entry(0x0C, 0); // VK_OEM_MINUS  -_
    t[0xBE] = entry(0x34, 0); // VK_OEM_PERIOD .>
    t[0xBF] = entry(0x35, 0); // VK_OEM_2      /?
    t[0xC0] = entry(0x29, 0); // VK_OEM_3      `~
    t[0xDB] = entry(0x1A, 0); // VK_OEM_4      [{
    t[0xDC] = entry(0x2B, 0); // VK_OEM_5      \|
    t[0xDD] = entry(0x1B, 0); // VK_OEM_6      ]}
    t[0xDE] = entry(0x28, 0); // VK_OEM_7      '"

    // ── Numeric keypad ───────────────────────────────────────────────────────
    t[0x60] = entry(0x52, 0); // VK_NUMPAD0
    t[0x61] = entry(0x4F, 0); // VK_NUMPAD1
    t[0x62] = entry(0x50, 0); // VK_NUMPAD2
    t[0x63] = entry(0x51, 0); // VK_NUMPAD3
    t[0x64] = entry(0x4B, 0); // VK_NUMPAD4
    t[0x65] = entry(0x4C, 0); // VK_NUMPAD5
    t[0x66] = entry(0x4D, 0); // VK_NUMPAD6
    t[0x67] = entry(0x47, 0); // VK_NUMPAD7
    t[0x68] = entry(0x48, 0); // VK_NUMPAD8
    t[0x69] = entry(0x49, 0); // VK_NUMPAD9
    t[0x6A] = entry(0x37, 0); // VK_MULTIPLY
    t[0x6B] = entry(0x4E, 0); // VK_ADD
    t[0x6D] = entry(0x4A, 0); // VK_SUBTRACT
    t[0x6E] = entry(0x53, 0); // VK_DECIMAL
    t[0x6F] = entry(0x35, EXT); // VK_DIVIDE

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    /// (VK, expected set-1 code, expected extended flag) for well-known keys.
    const STANDARD_MAPPINGS: &[(u8, u8, bool)] = &[
        (0x41, 0x1E, false), // A
        (0x5A, 0x2C, false), // Z
        (0x0D, 0x1C, false), // Enter
        (0x1B, 0x01, false), // Escape
        (0x20, 0x39, false), // Space
        (0x70, 0x3B, false), // F1
        (0x7B, 0x58, false), // F12
        (0xA3, 0x1D, true),  // Right Ctrl
        (0x2E, 0x53, true),  // Delete
        (0x26, 0x48, true),  // Up
        (0x90, 0x45, false), // NumLock
    ];

    #[test]
    fn test_standard_mappings() {
        for &(vk, set1, ext) in STANDARD_MAPPINGS {
            let (code, flags) = vk_to_set1(vk)
                .unwrap_or_else(|| panic!("VK 0x{vk:02X} must map"));
            assert_eq!(code.0, set1, "VK 0x{vk:02X}");
            assert_eq!(flags.extended(), ext, "VK 0x{vk:02X} extended flag");
        }
    }

    #[test]
    fn test_unmapped_vk_returns_none() {
        // VK_LBUTTON (mouse) and VK_PAUSE must not map.
        assert_eq!(vk_to_set1(0x01), None);
        assert_eq!(vk_to_set1(0x13), None);
    }

    #[test]
    fn test_vk_to_set1_never_panics_for_any_u8() {
        for vk in 0u8..=255 {
            let _ = vk_to_set1(vk); // Must not panic
        }
    }

    #[test]
    fn test_modifiers_carry_modifier_flag() {
        for vk in [0xA0u8, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0x5B, 0x5C] {
            let (_, flags) = vk_to_set1(vk).expect("modifier must map");
            assert!(flags.modifier(), "VK 0x{vk:02X} must carry MODIFIER");
        }
    }

    #[test]
    fn test_lock_keys_carry_lock_flag() {
        for vk in [0x14u8, 0x90, 0x91] {
            let (_, flags) = vk_to_set1(vk).expect("lock key must map");
            assert!(flags.lock(), "VK 0x{vk:02X} must carry LOCK");
        }
    }

    #[test]
    fn test_round_trip_vk_to_set1_to_vk_for_standard_keys() {
        for &(vk, _, _) in STANDARD_MAPPINGS {
            let (code, flags) = vk_to_set1(vk).expect("must map");
            let back = set1_to_vk(code, flags.extended());
            assert_eq!(back, Some(vk), "round-trip failed for VK 0x{vk:02X}");
        }
    }
}
