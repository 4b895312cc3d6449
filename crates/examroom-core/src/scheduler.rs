//! Periodic tick source for the live view.
//!
//! [`TickScheduler`] owns a single tokio task that fires on a fixed period
//! and hands [`Tick`]s to the consumer over a bounded channel. The consumer
//! (normally a loop calling [`crate::ExamBoard::tick`]) does the real work;
//! the scheduler only keeps time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Ticks buffered before new ones are dropped.
const TICK_BUFFER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Counts from zero for each `start`.
    pub seq: u64,
    pub at: DateTime<Utc>,
}

/// Owns the repeating tick task. Dropping the scheduler cancels it.
#[derive(Debug, Default)]
pub struct TickScheduler {
    task: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, replacing any task already running.
    ///
    /// The first tick fires immediately. Must be called from inside a tokio
    /// runtime. A consumer that falls behind loses ticks instead of
    /// queueing them; wall-clock state is recomputed on every tick anyway.
    pub fn start(&mut self, period: Duration) -> mpsc::Receiver<Tick> {
        self.cancel();
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seq = 0u64;
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }
                match tx.try_send(Tick { seq, at: Utc::now() }) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        trace!(seq, "tick dropped, consumer busy");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
                seq += 1;
            }
            debug!("tick task finished");
        });
        debug!(period_ms = period.as_millis() as u64, "tick scheduler started");
        self.task = Some(handle);
        rx
    }

    /// Stop the task if one is running. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
            debug!("tick scheduler cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
