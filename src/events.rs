// src/events.rs

//! Asynchronous diagnostics channel.
//!
//! The supervisor reports non-fatal problems (handler failures, stderr on a
//! successful one-shot run, kill failures) and failed calls as
//! [`SupervisorEvent`]s on a `tokio::sync::broadcast` channel. Emission never
//! blocks: with no subscribers the event is dropped, and a lagging
//! subscriber loses the oldest events rather than slowing the supervisor.

use tokio::sync::broadcast;
use tracing::trace;

use crate::types::ProcessId;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A failure, either fatal to a call or reported mid-stream.
    Error {
        id: Option<ProcessId>,
        message: String,
    },
    /// Captured stderr of a one-shot run that nevertheless exited with 0.
    Warning {
        id: Option<ProcessId>,
        message: String,
    },
}

impl SupervisorEvent {
    pub fn message(&self) -> &str {
        match self {
            SupervisorEvent::Error { message, .. } | SupervisorEvent::Warning { message, .. } => {
                message
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SupervisorEvent::Error { .. })
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SupervisorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.tx.subscribe()
    }

    pub fn error(&self, id: Option<ProcessId>, message: impl Into<String>) {
        self.emit(SupervisorEvent::Error {
            id,
            message: message.into(),
        });
    }

    pub fn warning(&self, id: Option<ProcessId>, message: impl Into<String>) {
        self.emit(SupervisorEvent::Warning {
            id,
            message: message.into(),
        });
    }

    fn emit(&self, event: SupervisorEvent) {
        if self.tx.send(event).is_err() {
            trace!("no event subscribers; dropping event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
