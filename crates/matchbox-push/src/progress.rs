//! Progress reporting.
//!
//! A push emits an ordered, one-way stream of [`ProgressEvent`]s over a
//! bounded tokio channel. Checkpoints must reach the receiver: a closed
//! channel there aborts the push. Per-chunk download updates are best-effort.

use crate::error::ProgressError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Events buffered between the pusher and a slow receiver
pub const DEFAULT_PROGRESS_BUFFER: usize = 32;

/// A single status update sent to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub message: String,
    /// 0-100, non-decreasing across one push
    pub percentage: u8,
    /// Set only on the final event of a successful push
    #[serde(default)]
    pub complete: bool,
}

/// A `[start, end]` percentage range owned by one step of the push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWindow {
    start: u8,
    end: u8,
}

impl ProgressWindow {
    /// Returns `None` unless `start <= end <= 100`.
    pub fn new(start: u8, end: u8) -> Option<Self> {
        (start <= end && end <= 100).then_some(Self { start, end })
    }

    pub fn start(self) -> u8 {
        self.start
    }

    pub fn end(self) -> u8 {
        self.end
    }

    /// `start + floor(done * (end - start) / total)`, clamped to the window.
    ///
    /// `total` must be non-zero.
    pub fn percentage(self, done: u64, total: u64) -> u8 {
        let span = u64::from(self.end - self.start);
        let offset = done.min(total) * span / total;
        // offset <= span <= 100
        self.start + u8::try_from(offset).unwrap_or(self.end - self.start)
    }
}

/// Sending half of a push's progress stream
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: mpsc::Sender<ProgressEvent>,
}

impl ProgressReporter {
    /// Create a reporter and the receiver the caller reads events from
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self { sender }, receiver)
    }

    /// Send a checkpoint event; fails if the receiver is gone
    pub async fn checkpoint(&self, message: &str, percentage: u8) -> Result<(), ProgressError> {
        self.send(ProgressEvent {
            message: message.to_string(),
            percentage,
            complete: false,
        })
        .await
    }

    /// Send the terminal completion event (100%)
    pub async fn complete(&self, message: &str) -> Result<(), ProgressError> {
        self.send(ProgressEvent {
            message: message.to_string(),
            percentage: 100,
            complete: true,
        })
        .await
    }

    /// Send an intermediate update, ignoring a closed receiver
    pub async fn update(&self, message: String, percentage: u8) {
        let event = ProgressEvent {
            message,
            percentage,
            complete: false,
        };
        if self.sender.send(event).await.is_err() {
            debug!("Progress receiver closed, dropping update at {}%", percentage);
        }
    }

    async fn send(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        self.sender.send(event).await.map_err(|closed| ProgressError {
            message: closed.0.message,
            percentage: closed.0.percentage,
        })
    }
}
