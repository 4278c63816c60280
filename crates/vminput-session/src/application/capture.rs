//! The keyboard capture state machine.
//!
//! Owns whether the keyboard is "captured" by a given view (one VM screen
//! window).  Capture is never taken synchronously: a request enters
//! `PendingCapture` and the actual OS grab runs from a timer a few hundred
//! milliseconds later.  The deferral avoids a thundering herd of windows
//! grabbing input during focus storms, and avoids fighting window managers
//! that also react to focus changes.
//!
//! # Generation guard (for beginners)
//!
//! Timers cannot be reliably un-scheduled: a callback may already be in
//! flight when we decide to cancel.  Instead of cancelling, every
//! scheduled finalize carries the generation number current at schedule
//! time, and the machine bumps its generation whenever the pending state
//! changes.  A firing timer whose generation no longer matches is stale
//! and does nothing — which also guarantees that two timer firings for
//! the same attempt issue at most one OS grab call.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::infrastructure::driver::InputDriver;
use crate::infrastructure::scheduler::{TaskScheduler, TimerEvent};

/// Index of a VM screen view within the session's window set.
pub type ViewIndex = u32;

/// Delay between a capture request and the OS grab attempt, and between
/// failed grab attempts.
pub const CAPTURE_FINALIZE_DELAY: Duration = Duration::from_millis(300);

/// Capture lifecycle state.  At most one view holds `Captured` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Released,
    PendingCapture(ViewIndex),
    Captured(ViewIndex),
}

/// Result of a finalize attempt, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeResult {
    /// The firing timer's generation no longer matches; nothing happened.
    Stale,
    /// The OS grab succeeded; the view now holds the capture.
    Grabbed(ViewIndex),
    /// The OS grab failed transiently; a retry is scheduled.
    Retrying,
}

/// The per-session capture state machine.
#[derive(Debug)]
pub struct CaptureStateMachine {
    state: CaptureState,
    /// Bumped whenever the pending target changes; guards stale timers.
    generation: u64,
    finalize_delay: Duration,
}

impl CaptureStateMachine {
    pub fn new(finalize_delay: Duration) -> Self {
        Self {
            state: CaptureState::Released,
            generation: 0,
            finalize_delay,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The view holding the capture, if any.
    pub fn captured_view(&self) -> Option<ViewIndex> {
        match self.state {
            CaptureState::Captured(view) => Some(view),
            _ => None,
        }
    }

    /// `true` while any view holds the capture.
    pub fn is_captured(&self) -> bool {
        matches!(self.state, CaptureState::Captured(_))
    }

    /// Requests capture for `view` and schedules the deferred finalize.
    ///
    /// No-op when the view already holds the capture.  A pending request
    /// for a different view is retargeted (the old timer goes stale via
    /// the generation bump).
    pub fn request_capture(&mut self, view: ViewIndex, scheduler: &dyn TaskScheduler) {
        match self.state {
            CaptureState::Captured(held) => {
                debug_assert_eq!(held, view, "capture requested while another view holds it");
            }
            CaptureState::PendingCapture(pending) if pending == view => {
                // Already on its way.
            }
            _ => {
                self.state = CaptureState::PendingCapture(view);
                self.generation += 1;
                debug!(view, generation = self.generation, "capture pending");
                scheduler.schedule_after(
                    self.finalize_delay,
                    TimerEvent::FinalizeCapture {
                        generation: self.generation,
                    },
                );
            }
        }
    }

    /// Performs the deferred grab attempt for a firing timer.
    ///
    /// Unbounded retries by design: the grab resource may become free at
    /// any time, so a failed attempt reschedules with the same fixed
    /// delay.  (No backoff, no attempt cap — long-standing behavior.)
    pub fn handle_finalize(
        &mut self,
        generation: u64,
        driver: &dyn InputDriver,
        scheduler: &dyn TaskScheduler,
    ) -> FinalizeResult {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale finalize timer");
            return FinalizeResult::Stale;
        }
        let CaptureState::PendingCapture(view) = self.state else {
            return FinalizeResult::Stale;
        };

        if driver.grab_keyboard(view) {
            info!(view, "keyboard captured");
            self.state = CaptureState::Captured(view);
            return FinalizeResult::Grabbed(view);
        }

        // Bump the generation so the attempt that just failed cannot be
        // replayed by a duplicate timer; only the retry scheduled here may
        // act next.
        self.generation += 1;
        warn!(view, "keyboard grab denied, retrying");
        scheduler.schedule_after(
            self.finalize_delay,
            TimerEvent::FinalizeCapture {
                generation: self.generation,
            },
        );
        FinalizeResult::Retrying
    }

    /// Releases the capture (or cancels a pending request).
    ///
    /// Idempotent: releasing while already `Released` does nothing and
    /// returns `false`.  The caller follows a `true` return with the
    /// release-all-pressed-keys sweep.
    pub fn release(&mut self, driver: &dyn InputDriver) -> bool {
        match self.state {
            CaptureState::Released => false,
            CaptureState::PendingCapture(view) => {
                // Invalidate the in-flight finalize timer.
                self.generation += 1;
                self.state = CaptureState::Released;
                debug!(view, "pending capture cancelled");
                true
            }
            CaptureState::Captured(view) => {
                driver.ungrab_keyboard(view);
                self.state = CaptureState::Released;
                info!(view, "keyboard released");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::driver::mock::MockDriver;
    use crate::infrastructure::scheduler::manual::ManualScheduler;

    fn fire_next(
        machine: &mut CaptureStateMachine,
        driver: &MockDriver,
        scheduler: &ManualScheduler,
    ) -> FinalizeResult {
        let (_, TimerEvent::FinalizeCapture { generation }) =
            scheduler.pop().expect("a finalize must be scheduled");
        machine.handle_finalize(generation, driver, scheduler)
    }

    #[test]
    fn test_request_then_finalize_captures_view() {
        // Arrange
        let driver = MockDriver::new();
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);

        // Act
        machine.request_capture(3, &scheduler);
        assert_eq!(machine.state(), CaptureState::PendingCapture(3));
        let result = fire_next(&mut machine, &driver, &scheduler);

        // Assert
        assert_eq!(result, FinalizeResult::Grabbed(3));
        assert_eq!(machine.captured_view(), Some(3));
        assert_eq!(driver.grab_calls(), vec![3]);
    }

    #[test]
    fn test_failed_grab_stays_pending_and_reschedules() {
        // Arrange
        let driver = MockDriver::new();
        driver.script_grab_results([false, false, true]);
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(0, &scheduler);

        // Act / Assert – two denials, then success
        assert_eq!(
            fire_next(&mut machine, &driver, &scheduler),
            FinalizeResult::Retrying
        );
        assert_eq!(machine.state(), CaptureState::PendingCapture(0));
        assert_eq!(
            fire_next(&mut machine, &driver, &scheduler),
            FinalizeResult::Retrying
        );
        assert_eq!(
            fire_next(&mut machine, &driver, &scheduler),
            FinalizeResult::Grabbed(0)
        );
        assert_eq!(driver.grab_calls().len(), 3);
    }

    #[test]
    fn test_duplicate_timer_issues_at_most_one_grab() {
        // Arrange – a denial so the machine stays pending after the first
        // firing, then replay the same generation.
        let driver = MockDriver::new();
        driver.script_grab_results([false]);
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(0, &scheduler);

        let (_, TimerEvent::FinalizeCapture { generation }) =
            scheduler.pop().expect("scheduled");

        // Act – first firing attempts the grab, duplicate must not
        machine.handle_finalize(generation, &driver, &scheduler);
        let dup = machine.handle_finalize(generation, &driver, &scheduler);

        // Assert
        assert_eq!(dup, FinalizeResult::Stale);
        assert_eq!(driver.grab_calls().len(), 1);
    }

    #[test]
    fn test_release_cancels_pending_finalize() {
        // Arrange
        let driver = MockDriver::new();
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(1, &scheduler);

        // Act – release before the timer fires
        assert!(machine.release(&driver));
        let result = fire_next(&mut machine, &driver, &scheduler);

        // Assert – the stale timer is a safe no-op
        assert_eq!(result, FinalizeResult::Stale);
        assert_eq!(machine.state(), CaptureState::Released);
        assert!(driver.grab_calls().is_empty());
    }

    #[test]
    fn test_release_twice_is_idempotent() {
        // Arrange
        let driver = MockDriver::new();
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(0, &scheduler);
        fire_next(&mut machine, &driver, &scheduler);

        // Act / Assert
        assert!(machine.release(&driver));
        assert_eq!(machine.state(), CaptureState::Released);
        assert!(!machine.release(&driver));
        assert_eq!(machine.state(), CaptureState::Released);
        assert_eq!(driver.ungrab_calls(), vec![0]);
    }

    #[test]
    fn test_request_while_captured_same_view_is_noop() {
        let driver = MockDriver::new();
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(2, &scheduler);
        fire_next(&mut machine, &driver, &scheduler);

        machine.request_capture(2, &scheduler);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(machine.captured_view(), Some(2));
    }

    #[test]
    fn test_retarget_pending_makes_old_timer_stale() {
        // Arrange
        let driver = MockDriver::new();
        let scheduler = ManualScheduler::new();
        let mut machine = CaptureStateMachine::new(CAPTURE_FINALIZE_DELAY);
        machine.request_capture(0, &scheduler);
        machine.request_capture(5, &scheduler);

        // Act – the first timer must be stale, the second grabs view 5
        let first = fire_next(&mut machine, &driver, &scheduler);
        let second = fire_next(&mut machine, &driver, &scheduler);

        // Assert
        assert_eq!(first, FinalizeResult::Stale);
        assert_eq!(second, FinalizeResult::Grabbed(5));
        assert_eq!(driver.grab_calls(), vec![5]);
    }
}
