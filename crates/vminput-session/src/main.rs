//! Replay binary: drives a full capture session against the mock driver.
//!
//! This is a demonstration and debugging aid, not a production entry
//! point (the production handler is embedded in a VM console process and
//! fed by real platform hooks).  It wires the handler to the mock
//! infrastructure, replays a scripted session — focus, capture, typing,
//! guest LED change, host-combo release — and logs the scan-code bytes
//! the guest would have received at each step.
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML config with serde defaults
//!  └─ KeyboardHandler::new() -- owns all per-session state machines
//!       ├─ MockDriver        -- scriptable InputDriver
//!       ├─ RecordingGuest    -- collects forwarded set-1 bytes
//!       └─ TokioScheduler    -- real 300ms finalize deferral
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vminput_core::scancode::LedState;
use vminput_session::application::handler::KeyboardHandler;
use vminput_session::infrastructure::driver::mock::{
    MockDriver, RecordingGuest, RecordingStatus,
};
use vminput_session::infrastructure::scheduler::tokio_timer::TokioScheduler;
use vminput_session::infrastructure::storage::config;

// Windows virtual-key codes used by the scripted session.
const VK_H: u32 = 0x48;
const VK_I: u32 = 0x49;
const VK_RCONTROL: u32 = 0xA3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.input.log_level.clone())),
        )
        .init();

    info!("vminput replay starting");

    let driver = Arc::new(MockDriver::new());
    let guest = Arc::new(RecordingGuest::new());
    let status = Arc::new(RecordingStatus::new());
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();
    let scheduler = Arc::new(TokioScheduler::new(timer_tx));

    let mut handler = KeyboardHandler::new(
        cfg.host_combo_set(),
        cfg.session_options(),
        driver.clone(),
        guest.clone(),
        status.clone(),
        scheduler,
    );
    info!(session = %handler.session_id(), "session created");

    // ── Focus in, wait out the capture deferral ───────────────────────────
    handler.notify_focus_in(0);
    if let Some(event) = timer_rx.recv().await {
        handler.handle_timer(event);
    }
    info!(state = ?handler.capture_state(), "after focus-in finalize");

    // ── Type "hi" while captured ──────────────────────────────────────────
    for vk in [VK_H, VK_I] {
        handler.handle_native_key(vk, true);
        handler.handle_native_key(vk, false);
    }
    info!(bytes = ?guest.bytes(), "guest received while captured");
    guest.clear();

    // ── Guest toggles NumLock, host LEDs follow ───────────────────────────
    handler.notify_guest_leds(LedState {
        num_lock: true,
        caps_lock: false,
        scroll_lock: false,
    });
    info!(pushes = ?driver.led_pushes(), "host LED pushes");

    // ── Host combo press+release toggles capture off ──────────────────────
    handler.handle_native_key(VK_RCONTROL, true);
    handler.handle_native_key(VK_RCONTROL, false);
    info!(
        state = ?handler.capture_state(),
        bytes = ?guest.bytes(),
        "after host combo release"
    );

    handler.teardown();
    info!(statuses = ?status.statuses(), "status transitions");
    info!("vminput replay finished");
    Ok(())
}
