//! Deterministic scheduler for unit tests.
//!
//! Scheduled events queue up in order; the test decides when each fires
//! by popping it and feeding it back into the handler.  This makes the
//! timer-deferred capture retry fully deterministic: no sleeps, no race
//! with a runtime clock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{TaskScheduler, TimerEvent};

/// A [`TaskScheduler`] that records scheduled events for manual delivery.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(Duration, TimerEvent)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.lock().expect("lock poisoned").len()
    }

    /// Pops the next scheduled event, if any, without firing it.
    pub fn pop(&self) -> Option<(Duration, TimerEvent)> {
        self.queue.lock().expect("lock poisoned").pop_front()
    }

    /// Drains every queued event.
    pub fn drain(&self) -> Vec<(Duration, TimerEvent)> {
        self.queue.lock().expect("lock poisoned").drain(..).collect()
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, event: TimerEvent) {
        self.queue
            .lock()
            .expect("lock poisoned")
            .push_back((delay, event));
    }
}
