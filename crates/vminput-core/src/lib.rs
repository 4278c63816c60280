//! # vminput-core
//!
//! Shared library for VM-Input containing the canonical scan-code
//! representation, the guest-facing wire encoding, and key code translation
//! tables for every supported host platform.
//!
//! This crate is used by the per-session capture logic in `vminput-session`.
//! It has zero dependencies on OS APIs, UI frameworks, or the VM engine.
//!
//! # Architecture overview (for beginners)
//!
//! VM-Input is the keyboard half of a virtual machine console: it decides
//! which keystrokes belong to the *guest* (the virtual machine shown in a
//! window) and which belong to the *host* (your real desktop).  When the
//! keyboard is "captured", every key you press is forwarded to the guest's
//! virtual keyboard device; a configurable *host combination* (e.g. Right
//! Ctrl) releases the capture again.
//!
//! This crate (`vminput-core`) is the shared foundation.  It defines:
//!
//! - **`scancode`** – The canonical key representation: legacy PC "set 1"
//!   scan codes (0–0x7F) plus extended/modifier/lock flag bits, and the
//!   exact byte sequences the guest's virtual keyboard device expects
//!   (press = code, release = code|0x80, 0xE0 prefix for extended keys).
//!
//! - **`keymap`** – Translation tables that convert native host key codes
//!   (Windows VK codes, X11/evdev keycodes, macOS CGKeyCodes) into the
//!   canonical set-1 representation.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/scancode/mod.rs).
pub mod keymap;
pub mod scancode;

// Re-export the most-used types at the crate root so callers can write
// `vminput_core::ScanCode` instead of `vminput_core::scancode::ScanCode`.
pub use keymap::KeyTranslator;
pub use scancode::stream::ScanCodeStream;
pub use scancode::{KeyFlags, ScanCode};
