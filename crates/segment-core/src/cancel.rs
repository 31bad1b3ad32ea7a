use std::sync::Arc;

use tokio::sync::watch;

use crate::error::PipelineError;

/// A clonable handle that every suspension point in the pipeline can poll or
/// await. Shared across the splitter, assembler and sectioner of a single
/// pipeline run; never shared across independent pipeline runs.
#[derive(Clone)]
pub struct CancelToken {
    receiver: Arc<watch::Receiver<bool>>,
}

/// The caller-side half: triggers cancellation for every [`CancelToken`]
/// derived from it.
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelToken {
    /// Create a fresh, not-yet-cancelled token and its triggering handle.
    pub fn new() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                receiver: Arc::new(receiver),
            },
            CancelHandle { sender },
        )
    }

    /// A token that can never be cancelled, for callers that don't need one.
    pub fn never() -> Self {
        let (token, handle) = Self::new();
        std::mem::forget(handle);
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Suspend until cancellation is requested. Returns immediately if the
    /// triggering [`CancelHandle`] was already dropped.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.as_ref().clone();
        while !*receiver.borrow() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Convenience check that turns a live cancellation into the pipeline's
    /// error type; call this at every suspension point before and after
    /// resuming.
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}
