//! Set-1 wire encoding for guest-bound scan-code sequences.
//!
//! The guest's virtual keyboard device consumes a flat byte stream in the
//! legacy set-1 encoding:
//!
//! - press    = `code`
//! - release  = `code | 0x80`
//! - extended = the byte pair is prefixed with `0xE0`
//!
//! The builder below accumulates a sequence so a whole gesture (e.g. a
//! synthesized Ctrl+Alt+Fn console switch) is handed to the guest as one
//! ordered unit.

use super::{KeyFlags, ScanCode};

/// The release bit OR-ed onto a set-1 make code to form its break code.
pub const RELEASE_BIT: u8 = 0x80;

/// Prefix byte for extended (0xE0-class) keys.
pub const EXTENDED_PREFIX: u8 = 0xE0;

/// Accumulates a guest-bound scan-code byte sequence.
///
/// # Examples
///
/// ```rust
/// use vminput_core::scancode::stream::ScanCodeStream;
/// use vminput_core::scancode::ScanCode;
///
/// let mut stream = ScanCodeStream::new();
/// stream.press(ScanCode::LEFT_SHIFT, false);
/// stream.release(ScanCode::LEFT_SHIFT, false);
/// assert_eq!(stream.into_bytes(), vec![0x2A, 0xAA]);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanCodeStream {
    bytes: Vec<u8>,
}

impl ScanCodeStream {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a press (make) code, with the 0xE0 prefix if `extended`.
    pub fn press(&mut self, code: ScanCode, extended: bool) -> &mut Self {
        if extended {
            self.bytes.push(EXTENDED_PREFIX);
        }
        self.bytes.push(code.0 & 0x7F);
        self
    }

    /// Appends a release (break) code, with the 0xE0 prefix if `extended`.
    pub fn release(&mut self, code: ScanCode, extended: bool) -> &mut Self {
        if extended {
            self.bytes.push(EXTENDED_PREFIX);
        }
        self.bytes.push((code.0 & 0x7F) | RELEASE_BIT);
        self
    }

    /// Appends a press immediately followed by its release.
    ///
    /// This is the shape of every synthesized "toggle" (lock-key
    /// reconciliation and the conditional Shift wrap around CapsLock).
    pub fn tap(&mut self, code: ScanCode, extended: bool) -> &mut Self {
        self.press(code, extended).release(code, extended)
    }

    /// Appends a press or release depending on `flags` and `pressed`.
    pub fn key_event(&mut self, code: ScanCode, flags: KeyFlags, pressed: bool) -> &mut Self {
        if pressed {
            self.press(code, flags.extended())
        } else {
            self.release(code, flags.extended())
        }
    }

    /// Appends the Ctrl+Alt+Fn console-switch sequence for `fn_index`
    /// (0 = F1 … 11 = F12): presses for Ctrl, Alt, and the function key,
    /// then releases in reverse order.
    ///
    /// This is the conventional way a VM console forwards "host combo + Fn"
    /// to the guest so a Linux guest can switch virtual terminals.
    pub fn ctrl_alt_fn(&mut self, fn_index: u8) -> &mut Self {
        let fn_code = ScanCode::function_key(fn_index);
        self.press(ScanCode::LEFT_CTRL, false)
            .press(ScanCode::LEFT_ALT, false)
            .press(fn_code, false)
            .release(fn_code, false)
            .release(ScanCode::LEFT_ALT, false)
            .release(ScanCode::LEFT_CTRL, false)
    }

    /// Appends the Ctrl+Alt+Del sequence (Del is extended).
    pub fn ctrl_alt_del(&mut self) -> &mut Self {
        self.press(ScanCode::LEFT_CTRL, false)
            .press(ScanCode::LEFT_ALT, false)
            .press(ScanCode::DELETE, true)
            .release(ScanCode::DELETE, true)
            .release(ScanCode::LEFT_ALT, false)
            .release(ScanCode::LEFT_CTRL, false)
    }

    /// Returns `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the accumulated bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the builder, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
