//! Progress messages sent to the caller while recipes are fetched.

use tokio::sync::mpsc;

use crate::types::Progress;

/// Sending half of the caller's progress channel.
///
/// Unbounded, so a slow reader never holds up recipe tasks. The caller keeps
/// the receiver and drains it concurrently with the import.
pub type ProgressSender = mpsc::UnboundedSender<Progress>;

pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<Progress>) {
    mpsc::unbounded_channel()
}

/// Emits one `{value, total}` message per finished recipe.
pub struct ProgressReporter {
    sender: ProgressSender,
    total: usize,
    completed: usize,
}

impl ProgressReporter {
    pub fn new(sender: ProgressSender, total: usize) -> Self {
        Self {
            sender,
            total,
            completed: 0,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Record one finished recipe and notify the caller.
    pub fn item_finished(&mut self) -> Progress {
        self.completed += 1;
        let progress = Progress {
            value: self.completed,
            total: self.total,
        };
        if self.sender.send(progress).is_err() {
            tracing::debug!(value = progress.value, total = progress.total, "progress receiver dropped");
        }
        progress
    }
}
