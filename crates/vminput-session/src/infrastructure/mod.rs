//! Infrastructure layer for the session crate.
//!
//! Contains the OS-facing boundary: the input-driver trait the platform
//! backends implement, the scheduled-task abstraction backing the deferred
//! capture finalize, and TOML configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vminput_core`, but the application state machines only ever see the
//! traits defined here, never a concrete platform backend.

pub mod driver;
pub mod scheduler;
pub mod storage;
