//! Application layer for the per-session capture logic.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules) and the infrastructure (OS hooks, timers, config
//! files).  The state machines in this layer:
//!
//! - **Orchestrate** the per-session keyboard policy (when to capture, when
//!   a gesture is a host hot-key, when to synthesize lock-key toggles).
//! - **Depend on abstractions** (the driver, guest-keyboard, and scheduler
//!   traits) rather than concrete implementations, so the OS-specific
//!   drivers can be swapped without changing this code.
//! - **Contain no OS calls, no timers, no file system access.**
//!
//! # Sub-modules
//!
//! - **`keystate`** – The 128-slot pressed-key table and the bounded
//!   lock-state reconciliation ("fix modifier state") logic.
//!
//! - **`combo`**    – The host-key-combo detector: watches the canonical
//!   key stream for the configured host combination and classifies each
//!   full-combo gesture as a capture toggle or a hot-key.
//!
//! - **`capture`**  – The Released/PendingCapture/Captured state machine
//!   with its timer-deferred, generation-guarded grab retry.
//!
//! - **`led_sync`** – The host indicator LED synchronization policy,
//!   including the per-device deny list and the idempotent teardown.
//!
//! - **`handler`**  – The `KeyboardHandler` glue that owns all of the
//!   above for one running VM session.  This is the most critical piece —
//!   it runs on every keystroke.

pub mod capture;
pub mod combo;
pub mod handler;
pub mod keystate;
pub mod led_sync;
