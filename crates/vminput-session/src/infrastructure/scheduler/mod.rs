//! Scheduled-task abstraction backing the deferred capture finalize.
//!
//! The capture state machine never blocks: "try again in N milliseconds"
//! is expressed by handing the scheduler a [`TimerEvent`] that the session
//! loop feeds back into the handler when it fires.  Cancellation is by
//! generation token, not by handle — a stale timer firing after the
//! pending capture was cancelled is a safe no-op because the handler
//! checks the generation before acting.
//!
//! Two implementations exist:
//!
//! - [`manual::ManualScheduler`] – deterministic, test-driven: events
//!   queue up and the test fires them explicitly.
//! - [`tokio_timer::TokioScheduler`] – production: spawns a sleep task
//!   that delivers the event into the session's mpsc channel.

pub mod manual;
pub mod tokio_timer;

use std::time::Duration;

/// A deferred unit of work addressed to the session handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Attempt the OS grab for the pending capture request.  The
    /// generation must match the capture machine's current generation or
    /// the event is stale and ignored.
    FinalizeCapture { generation: u64 },
}

/// Trait for deferring a [`TimerEvent`] by a fixed delay.
pub trait TaskScheduler: Send + Sync {
    /// Schedules `event` to be delivered to the session after `delay`.
    fn schedule_after(&self, delay: Duration, event: TimerEvent);
}
