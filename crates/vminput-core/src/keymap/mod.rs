//! Native key code → canonical set-1 translation tables.
//!
//! The canonical representation is the legacy PC set-1 scan code (see
//! [`crate::scancode`]).  Native host codes are translated to set 1 at the
//! driver boundary; canonical codes are forwarded verbatim to the guest's
//! virtual keyboard device, so every table here must be bit-exact with the
//! set-1 layout.
//!
//! Translation returns `None` for unmapped native codes.  The session logic
//! treats `None` as "ignore this event" — the key is neither forwarded to
//! the guest nor tracked in the pressed-key table.

pub mod linux_x11;
pub mod macos_cg;
pub mod windows_vk;

use crate::scancode::{KeyFlags, ScanCode};

/// Packs a set-1 code and its flags into one table entry.
///
/// 0 is the "unmapped" sentinel, which is safe because no real key maps to
/// set-1 code 0 with empty flags.
pub(crate) const fn entry(code: u8, flags: u8) -> u16 {
    ((flags as u16) << 8) | code as u16
}

/// Unpacks a table entry produced by [`entry`].
pub(crate) fn unpack(raw: u16) -> Option<(ScanCode, KeyFlags)> {
    if raw == 0 {
        return None;
    }
    Some((ScanCode((raw & 0xFF) as u8), KeyFlags((raw >> 8) as u8)))
}

/// Unified key translator providing all translation directions.
pub struct KeyTranslator;

impl KeyTranslator {
    /// Translates a Windows Virtual Key code to a canonical set-1 code.
    ///
    /// Returns `None` if no mapping exists for `vk`.
    pub fn windows_vk_to_set1(vk: u8) -> Option<(ScanCode, KeyFlags)> {
        windows_vk::vk_to_set1(vk)
    }

    /// Translates an X11 keycode (evdev keycode + 8) to a canonical set-1
    /// code.
    pub fn x11_keycode_to_set1(keycode: u8) -> Option<(ScanCode, KeyFlags)> {
        linux_x11::keycode_to_set1(keycode)
    }

    /// Translates a macOS `CGKeyCode` to a canonical set-1 code.
    pub fn macos_keycode_to_set1(code: u16) -> Option<(ScanCode, KeyFlags)> {
        macos_cg::cgkeycode_to_set1(code)
    }

    /// Translates a canonical set-1 code back to a Windows Virtual Key code.
    ///
    /// Used for diagnostics and the reverse-lookup consistency checks;
    /// returns `None` for set-1 codes with no VK equivalent.
    pub fn set1_to_windows_vk(code: ScanCode, extended: bool) -> Option<u8> {
        windows_vk::set1_to_vk(code, extended)
    }

    /// Resolves a set-1 code to its printable ASCII symbol, if it has one.
    ///
    /// Only alphanumerics resolve; this backs host-shortcut lookup when a
    /// letter or digit is pressed while the host combo is held.
    pub fn set1_to_ascii(code: ScanCode) -> Option<char> {
        set1_to_ascii_char(code)
    }
}

/// ASCII symbols for the set-1 alphanumeric block.
fn set1_to_ascii_char(code: ScanCode) -> Option<char> {
    let ch = match code.0 {
        // Digit row 0x02–0x0B.
        0x02 => '1',
        0x03 => '2',
        0x04 => '3',
        0x05 => '4',
        0x06 => '5',
        0x07 => '6',
        0x08 => '7',
        0x09 => '8',
        0x0A => '9',
        0x0B => '0',
        // QWERTY rows.
        0x10 => 'q',
        0x11 => 'w',
        0x12 => 'e',
        0x13 => 'r',
        0x14 => 't',
        0x15 => 'y',
        0x16 => 'u',
        0x17 => 'i',
        0x18 => 'o',
        0x19 => 'p',
        0x1E => 'a',
        0x1F => 's',
        0x20 => 'd',
        0x21 => 'f',
        0x22 => 'g',
        0x23 => 'h',
        0x24 => 'j',
        0x25 => 'k',
        0x26 => 'l',
        0x2C => 'z',
        0x2D => 'x',
        0x2E => 'c',
        0x2F => 'v',
        0x30 => 'b',
        0x31 => 'n',
        0x32 => 'm',
        _ => return None,
    };
    Some(ch)
}
