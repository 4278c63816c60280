//! Tokio-backed scheduler for production use.
//!
//! Each `schedule_after` spawns a task that sleeps and then delivers the
//! event into the session's unbounded channel.  The session loop is the
//! single consumer, so ordering between timer events and key events is
//! whatever the channel observed — exactly the "no global ordering"
//! assumption the state machines are written against.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use super::{TaskScheduler, TimerEvent};

/// A [`TaskScheduler`] that delivers events through a tokio mpsc channel.
pub struct TokioScheduler {
    tx: UnboundedSender<TimerEvent>,
}

impl TokioScheduler {
    /// Creates a scheduler delivering into `tx`.
    ///
    /// Must be called from within a tokio runtime context; the spawned
    /// sleep tasks run on that runtime.
    pub fn new(tx: UnboundedSender<TimerEvent>) -> Self {
        Self { tx }
    }
}

impl TaskScheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, event: TimerEvent) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(?event, "timer fired");
            // The receiver is gone when the session loop has shut down; a
            // late timer is then irrelevant.
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_event_delivered_after_delay() {
        // Arrange
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx);

        // Act
        scheduler.schedule_after(
            Duration::from_millis(300),
            TimerEvent::FinalizeCapture { generation: 7 },
        );
        tokio::time::advance(Duration::from_millis(301)).await;

        // Assert
        let event = rx.recv().await.expect("event must arrive");
        assert_eq!(event, TimerEvent::FinalizeCapture { generation: 7 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_does_not_panic_late_timer() {
        // Arrange
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx);
        scheduler.schedule_after(
            Duration::from_millis(100),
            TimerEvent::FinalizeCapture { generation: 1 },
        );
        drop(rx);

        // Act / Assert – advancing past the deadline must not panic
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
    }
}
