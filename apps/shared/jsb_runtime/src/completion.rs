//! Completion sinks
//!
//! A [`CompletionSink`] is handed to the bridge together with a request and
//! receives exactly one [`EvalOutcome`]. Firing consumes the sink, and a sink
//! that is dropped unfired (for example because its task was aborted) reports
//! [`BridgeError::Abandoned`], so the callback can neither run twice nor be
//! skipped.

use std::fmt;

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{BridgeError, EvalOutcome};

type Callback = Box<dyn FnOnce(EvalOutcome) + Send + 'static>;

pub struct CompletionSink {
    callback: Option<Callback>,
}

impl CompletionSink {
    /// Create a sink from a callback
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(EvalOutcome) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Create a sink that hands `data` back to the callback alongside the outcome
    pub fn with_user_data<T, F>(data: T, callback: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(EvalOutcome, T) + Send + 'static,
    {
        Self::new(move |outcome| callback(outcome, data))
    }

    /// Create a sink whose outcome is delivered on a oneshot channel
    pub fn channel() -> (Self, oneshot::Receiver<EvalOutcome>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self::new(move |outcome| {
            // The receiver may have stopped waiting; nothing left to notify then
            let _ = tx.send(outcome);
        });
        (sink, rx)
    }

    /// Deliver the outcome
    pub fn complete(mut self, outcome: EvalOutcome) {
        self.fire(outcome);
    }

    fn fire(&mut self, outcome: EvalOutcome) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl Drop for CompletionSink {
    fn drop(&mut self) {
        if self.callback.is_some() {
            trace!("Completion sink dropped unfired, reporting abandoned request");
            self.fire(Err(BridgeError::Abandoned));
        }
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSink")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}
