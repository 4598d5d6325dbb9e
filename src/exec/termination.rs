// src/exec/termination.rs

//! Per-process cancellation signal.
//!
//! Explicit stop, the timeout timer and the output limit all race to
//! terminate the same process. [`TerminationSignal::cancel`] lets exactly one
//! of them win; the reason recorded by the winner is what the execution
//! resolves with. Stream readers watch the same signal and stop delivering
//! output as soon as it fires.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// `stop_process` / `stop_all` / `ProcessController::stop`.
    Stopped,
    /// The configured timeout (in milliseconds) elapsed.
    TimedOut(u64),
    /// A buffered stream grew past `max_buffer` bytes.
    OutputLimit(usize),
}

#[derive(Debug)]
pub struct TerminationSignal {
    tx: watch::Sender<Option<CancelReason>>,
}

impl TerminationSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Record `reason` and wake all waiters. Returns `false` if the signal
    /// had already fired, in which case the earlier reason is kept.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }

    pub fn reason(&self) -> Option<CancelReason> {
        *self.tx.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once the signal has fired (immediately if it already has).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(Option::is_some).await;
    }
}

impl Default for TerminationSignal {
    fn default() -> Self {
        Self::new()
    }
}
