//! Integration tests for the translation-to-wire pipeline.
//!
//! These drive native key codes through the public translation API and the
//! stream builder together, asserting that the guest-bound byte sequences
//! are bit-exact set 1 regardless of which host platform produced them.

use vminput_core::{KeyFlags, KeyTranslator, ScanCode, ScanCodeStream};

/// Translates a native code, panicking with context if unmapped.
fn win(vk: u8) -> (ScanCode, KeyFlags) {
    KeyTranslator::windows_vk_to_set1(vk)
        .unwrap_or_else(|| panic!("VK 0x{vk:02X} must map"))
}

fn x11(keycode: u8) -> (ScanCode, KeyFlags) {
    KeyTranslator::x11_keycode_to_set1(keycode)
        .unwrap_or_else(|| panic!("X11 keycode {keycode} must map"))
}

fn mac(code: u16) -> (ScanCode, KeyFlags) {
    KeyTranslator::macos_keycode_to_set1(code)
        .unwrap_or_else(|| panic!("CGKeyCode 0x{code:02X} must map"))
}

/// Renders a press+release pair for one translated key.
fn tap_bytes((code, flags): (ScanCode, KeyFlags)) -> Vec<u8> {
    let mut stream = ScanCodeStream::new();
    stream.press(code, flags.extended());
    stream.release(code, flags.extended());
    stream.into_bytes()
}

#[test]
fn test_same_physical_key_encodes_identically_on_all_platforms() {
    // (windows VK, x11 keycode, macOS CGKeyCode, label)
    let keys: &[(u8, u8, u16, &str)] = &[
        (0x41, 38, 0x00, "A"),
        (0x0D, 36, 0x24, "Enter"),
        (0x1B, 9, 0x35, "Escape"),
        (0x20, 65, 0x31, "Space"),
        (0xA3, 105, 0x3E, "Right Ctrl"),
        (0x14, 66, 0x39, "CapsLock"),
        (0x2E, 119, 0x75, "Delete"),
        (0x70, 67, 0x7A, "F1"),
        (0x7B, 96, 0x6F, "F12"),
    ];

    for &(vk, keycode, cg, label) in keys {
        let from_win = tap_bytes(win(vk));
        let from_x11 = tap_bytes(x11(keycode));
        let from_mac = tap_bytes(mac(cg));
        assert_eq!(from_win, from_x11, "{label}: windows vs x11");
        assert_eq!(from_win, from_mac, "{label}: windows vs macos");
    }
}

#[test]
fn test_typed_word_produces_expected_set1_stream() {
    // "hi" typed on Windows: H (VK 0x48) then I (VK 0x49).
    let mut stream = ScanCodeStream::new();
    for vk in [0x48u8, 0x49] {
        let (code, flags) = win(vk);
        stream.press(code, flags.extended());
        stream.release(code, flags.extended());
    }

    // H is set-1 0x23, I is 0x17.
    assert_eq!(stream.into_bytes(), vec![0x23, 0xA3, 0x17, 0x97]);
}

#[test]
fn test_right_hand_modifiers_carry_the_extended_prefix() {
    // Right Ctrl from every platform must render E0 1D / E0 9D.
    for bytes in [
        tap_bytes(win(0xA3)),
        tap_bytes(x11(105)),
        tap_bytes(mac(0x3E)),
    ] {
        assert_eq!(bytes, vec![0xE0, 0x1D, 0xE0, 0x9D]);
    }
}

#[test]
fn test_numpad_and_navigation_variants_stay_distinct() {
    // Numpad 7 (plain 0x47) and Home (E0 47) share a base code; the wire
    // bytes must differ or the guest cannot tell the keys apart.
    let numpad7 = tap_bytes(win(0x67));
    let home = tap_bytes(win(0x24));
    assert_eq!(numpad7, vec![0x47, 0xC7]);
    assert_eq!(home, vec![0xE0, 0x47, 0xE0, 0xC7]);
}

#[test]
fn test_console_switch_sequences_cover_all_function_keys() {
    // Every Ctrl+Alt+Fn sequence must name a real F-key make code and
    // release in reverse order.
    for fn_index in 0..12u8 {
        let mut stream = ScanCodeStream::new();
        stream.ctrl_alt_fn(fn_index);
        let bytes = stream.into_bytes();

        assert_eq!(bytes.len(), 6, "F{}", fn_index + 1);
        assert_eq!(bytes[0], 0x1D);
        assert_eq!(bytes[1], 0x38);
        let fn_code = bytes[2];
        assert_eq!(
            ScanCode(fn_code).function_key_index(),
            Some(fn_index),
            "F{} must use its own make code",
            fn_index + 1
        );
        assert_eq!(bytes[3], fn_code | 0x80);
        assert_eq!(bytes[4], 0xB8);
        assert_eq!(bytes[5], 0x9D);
    }
}
