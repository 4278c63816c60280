//! macOS `CGKeyCode` → canonical set-1 translation table.
//!
//! Reference: Carbon `Events.h` (`kVK_*` constants).  CGKeyCodes are the
//! ancient Mac virtual key numbers; they predate USB and follow no
//! discernible order, so this table is a flat enumeration.
//!
//! macOS has no NumLock; `kVK_ANSI_KeypadClear` occupies the NumLock
//! position on a PC keyboard and maps to set-1 0x45 so guests still get a
//! usable NumLock key.

use super::{entry, unpack};
use crate::scancode::{KeyFlags, ScanCode};

/// Translates a macOS `CGKeyCode` to a canonical set-1 code.
///
/// Returns `None` for codes above 0x7F or without a set-1 equivalent
/// (media keys, the Fn key).
pub fn cgkeycode_to_set1(code: u16) -> Option<(ScanCode, KeyFlags)> {
    if code > 0x7F {
        return None;
    }
    unpack(CG_TO_SET1_TABLE[code as usize])
}

const EXT: u8 = KeyFlags::EXTENDED;
const MOD: u8 = KeyFlags::MODIFIER;
const LOCK: u8 = KeyFlags::LOCK;

/// Complete CGKeyCode → set-1 mapping table indexed by key code (0x00–0x7F).
const CG_TO_SET1_TABLE: [u16; 128] = {
    let mut t = [0u16; 128];

    // ── Letters ──────────────────────────────────────────────────────────────
    t[0x00] = entry(0x1E, 0); // kVK_ANSI_A
    t[0x01] = entry(0x1F, 0); // kVK_ANSI_S
    t[0x02] = entry(0x20, 0); // kVK_ANSI_D
    t[0x03] = entry(0x21, 0); // kVK_ANSI_F
    t[0x04] = entry(0x23, 0); // kVK_ANSI_H
    t[0x05] = entry(0x22, 0); // kVK_ANSI_G
    t[0x06] = entry(0x2C, 0); // kVK_ANSI_Z
    t[0x07] = entry(0x2D, 0); // kVK_ANSI_X
    t[0x08] = entry(0x2E, 0); // kVK_ANSI_C
    t[0x09] = entry(0x2F, 0); // kVK_ANSI_V
    t[0x0B] = entry(0x30, 0); // kVK_ANSI_B
    t[0x0C] = entry(0x10, 0); // kVK_ANSI_Q
    t[0x0D] = entry(0x11, 0); // kVK_ANSI_W
    t[0x0E] = entry(0x12, 0); // kVK_ANSI_E
    t[0x0F] = entry(0x13, 0); // kVK_ANSI_R
    t[0x10] = entry(0x15, 0); // kVK_ANSI_Y
    t[0x11] = entry(0x14, 0); // kVK_ANSI_T
    t[0x1F] = entry(0x18, 0); // kVK_ANSI_O
    t[0x20] = entry(0x16, 0); // kVK_ANSI_U
    t[0x22] = entry(0x17, 0); // kVK_ANSI_I
    t[0x23] = entry(0x19, 0); // kVK_ANSI_P
    t[0x25] = entry(0x26, 0); // kVK_ANSI_L
    t[0x26] = entry(0x24, 0); // kVK_ANSI_J
    t[0x28] = entry(0x25, 0); // kVK_ANSI_K
    t[0x2D] = entry(0x31, 0); // kVK_ANSI_N
    t[0x2E] = entry(0x32, 0); // kVK_ANSI_M

    // ── Digit row ────────────────────────────────────────────────────────────
    t[0x12] = entry(0x02, 0); // kVK_ANSI_1
    t[0x13] = entry(0x03, 0); // kVK_ANSI_2
    t[0x14] = entry(0x04, 0); // kVK_ANSI_3
    t[0x15] = entry(0x05, 0); // kVK_ANSI_4
    t[0x16] = entry(0x07, 0); // kVK_ANSI_6
    t[0x17] = entry(0x06, 0); // kVK_ANSI_5
    t[0x19] = entry(0x0A, 0); // kVK_ANSI_9
    t[0x1A] = entry(0x08, 0); // kVK_ANSI_7
    t[0x1C] = entry(0x09, 0); // kVK_ANSI_8
    t[0x1D] = entry(0x0B, 0); // kVK_ANSI_0

    // ── Punctuation ──────────────────────────────────────────────────────────
    t[0x18] = entry(0x0D, 0); // kVK_ANSI_Equal
    t[0x1B] = entry(0x0C, 0); // kVK_ANSI_Minus
    t[0x1E] = entry(0x1B, 0); // kVK_ANSI_RightBracket
    t[0x21] = entry(0x1A, 0); // kVK_ANSI_LeftBracket
    t[0x27] = entry(0x28, 0); // kVK_ANSI_Quote
    t[0x29] = entry(0x27, 0); // kVK_ANSI_Semicolon
    t[0x2A] = entry(0x2B, 0); // kVK_ANSI_Backslash
    t[0x2B] = entry(0x33, 0); // kVK_ANSI_Comma
    t[0x2C] = entry(0x35, 0); // kVK_ANSI_Slash
    t[0x2F] = entry(0x34, 0); // kVK_ANSI_Period
    t[0x32] = entry(0x29, 0); // kVK_ANSI_Grave

    // ── Control keys ─────────────────────────────────────────────────────────
    t[0x24] = entry(0x1C, 0); // kVK_Return
    t[0x30] = entry(0x0F, 0); // kVK_Tab
    t[0x31] = entry(0x39, 0); // kVK_Space
    t[0x33] = entry(0x0E, 0); // kVK_Delete (backspace)
    t[0x35] = entry(0x01, 0); // kVK_Escape

    // ── Modifiers ────────────────────────────────────────────────────────────
    t[0x37] = entry(0x5B, MOD | EXT); // kVK_Command
    t[0x36] = entry(0x5C, MOD | EXT); // kVK_RightCommand
    t[0x38] = entry(0x2A, MOD); // kVK_Shift
    t[0x39] = entry(0x3A, LOCK); // kVK_CapsLock
    t[0x3A] = entry(0x38, MOD); // kVK_Option
    t[0x3B] = entry(0x1D, MOD); // kVK_Control
    t[0x3C] = entry(0x36, MOD); // kVK_RightShift
    t[0x3D] = entry(0x38, MOD | EXT); // kVK_RightOption
    t[0x3E] = entry(0x1D, MOD | EXT); // kVK_RightControl

    // ── Function keys ────────────────────────────────────────────────────────
    t[0x7A] = entry(0x3B, 0); // kVK_F1
    t[0x78] = entry(0x3C, 0); // kVK_F2
    t[0x63] = entry(0x3D, 0); // kVK_F3
    t[0x76] = entry(0x3E, 0); // kVK_F4
    t[0x60] = entry(0x3F, 0); // kVK_F5
    t[0x61] = entry(0x40, 0); // kVK_F6
    t[0x62] = entry(0x41, 0); // kVK_F7
    t[0x64] = entry(0x42, 0); // kVK_F8
    t[0x65] = entry(0x43, 0); // kVK_F9
    t[0x6D] = entry(0x44, 0); // kVK_F10
    t[0x67] = entry(0x57, 0); // kVK_F11
    t[0x6F] = entry(0x58, 0); // kVK_F12

    // ── Navigation block ─────────────────────────────────────────────────────
    t[0x72] = entry(0x52, EXT); // kVK_Help (Insert position)
    t[0x73] = entry(0x47, EXT); // kVK_Home
    t[0x74] = entry(0x49, EXT); // kVK_PageUp
    t[0x75] = entry(0x53, EXT); // kVK_ForwardDelete
    t[0x77] = entry(0x4F, EXT); // kVK_End
    t[0x79] = entry(0x51, EXT); // kVK_PageDown
    t[0x7B] = entry(0x4B, EXT); // kVK_LeftArrow
    t[0x7C] = entry(0x4D, EXT); // kVK_RightArrow
    t[0x7D] = entry(0x50, EXT); // kVK_DownArrow
    t[0x7E] = entry(0x48, EXT); // kVK_UpArrow

    // ── Numeric keypad ───────────────────────────────────────────────────────
    t[0x41] = entry(0x53, 0); // kVK_ANSI_KeypadDecimal
    t[0x43] = entry(0x37, 0); // kVK_ANSI_KeypadMultiply
    t[0x45] = entry(0x4E, 0); // kVK_ANSI_KeypadPlus
    t[0x47] = entry(0x45, LOCK); // kVK_ANSI_KeypadClear (NumLock position)
    t[0x4B] = entry(0x35, EXT); // kVK_ANSI_KeypadDivide
    t[0x4C] = entry(0x1C, EXT); // kVK_ANSI_KeypadEnter
    t[0x4E] = entry(0x4A, 0); // kVK_ANSI_KeypadMinus
    t[0x52] = entry(0x52, 0); // kVK_ANSI_Keypad0
    t[0x53] = entry(0x4F, 0); // kVK_ANSI_Keypad1
    t[0x54] = entry(0x50, 0); // kVK_ANSI_Keypad2
    t[0x55] = entry(0x51, 0); // kVK_ANSI_Keypad3
    t[0x56] = entry(0x4B, 0); // kVK_ANSI_Keypad4
    t[0x57] = entry(0x4C, 0); // kVK_ANSI_Keypad5
    t[0x58] = entry(0x4D, 0); // kVK_ANSI_Keypad6
    t[0x59] = entry(0x47, 0); // kVK_ANSI_Keypad7
    t[0x5B] = entry(0x48, 0); // kVK_ANSI_Keypad8
    t[0x5C] = entry(0x49, 0); // kVK_ANSI_Keypad9

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_and_digit_mappings() {
        let (a, _) = cgkeycode_to_set1(0x00).expect("A must map");
        assert_eq!(a, ScanCode(0x1E));
        let (one, _) = cgkeycode_to_set1(0x12).expect("1 must map");
        assert_eq!(one, ScanCode(0x02));
    }

    #[test]
    fn test_right_side_modifiers_are_extended() {
        for cg in [0x36u16, 0x3D, 0x3E] {
            let (_, flags) = cgkeycode_to_set1(cg).expect("modifier must map");
            assert!(flags.modifier() && flags.extended(), "CG 0x{cg:02X}");
        }
    }

    #[test]
    fn test_caps_lock_carries_lock_flag() {
        let (code, flags) = cgkeycode_to_set1(0x39).expect("CapsLock must map");
        assert_eq!(code, ScanCode::CAPS_LOCK);
        assert!(flags.lock());
    }

    #[test]
    fn test_keypad_clear_stands_in_for_numlock() {
        let (code, flags) = cgkeycode_to_set1(0x47).expect("KeypadClear must map");
        assert_eq!(code, ScanCode::NUM_LOCK);
        assert!(flags.lock());
    }

    #[test]
    fn test_out_of_range_and_fn_key_are_unmapped() {
        assert_eq!(cgkeycode_to_set1(0x80), None);
        assert_eq!(cgkeycode_to_set1(0x3F), None); // kVK_Function
    }
}
