//! Cancellable dwell timers for queue entries

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a pending expiry.
///
/// The generation identifies the queue entry the timer was scheduled for; a
/// firing timer only removes the entry while the generation still matches.
#[derive(Debug)]
pub struct ExpiryHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl ExpiryHandle {
    /// Run `on_expire` once `after` has elapsed
    pub fn schedule<F>(generation: u64, after: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            on_expire();
        });
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer. Safe to call after it fired.
    pub fn cancel(self) {
        if !self.task.is_finished() {
            debug!("Cancelling expiry timer (generation {})", self.generation);
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
