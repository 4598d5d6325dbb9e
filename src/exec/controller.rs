// src/exec/controller.rs

use std::fmt;

use tokio::sync::watch;

use crate::errors::{ExecError, Result};
use crate::exec::runner::Termination;
use crate::exec::termination::CancelReason;
use crate::supervisor::Supervisor;
use crate::types::ProcessId;

/// Handle to a streaming execution, returned as soon as the process is
/// spawned and registered.
#[derive(Clone)]
pub struct ProcessController {
    id: ProcessId,
    supervisor: Supervisor,
    done: watch::Receiver<Option<Termination>>,
}

impl fmt::Debug for ProcessController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessController")
            .field("id", &self.id)
            .field("done", &*self.done.borrow())
            .finish_non_exhaustive()
    }
}

impl ProcessController {
    pub(crate) fn new(
        id: ProcessId,
        supervisor: Supervisor,
        done: watch::Receiver<Option<Termination>>,
    ) -> Self {
        Self {
            id,
            supervisor,
            done,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Stop the process. Returns `false` if it was already gone.
    pub fn stop(&self) -> bool {
        self.supervisor.stop_process(self.id)
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_process_running(self.id)
    }

    /// Exit code, once the execution has finished on its own.
    ///
    /// This stays `None` after the child has exited for as long as its
    /// output is still being delivered (or a grandchild keeps the pipes
    /// open), the same window in which [`ProcessController::is_running`]
    /// is still `true`.
    pub fn exit_code(&self) -> Option<i32> {
        match &*self.done.borrow() {
            Some(Termination::Exited(code)) => *code,
            _ => None,
        }
    }

    /// Wait until the execution has fully finished.
    ///
    /// - natural exit: `Ok(Some(code))`, whatever the code (a non-zero exit
    ///   is not an error in streaming mode), or `Ok(None)` if the process
    ///   died from a signal;
    /// - stopped: `Ok(None)`;
    /// - timed out: `Err(ExecError::Timeout(ms))`.
    pub async fn wait(&self) -> Result<Option<i32>> {
        let mut done = self.done.clone();
        let termination = done
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ExecError::Wait("process monitor went away".to_string()))?
            .clone();

        match termination {
            Some(Termination::Exited(code)) => Ok(code),
            Some(Termination::Cancelled(CancelReason::Stopped)) => Ok(None),
            Some(Termination::Cancelled(CancelReason::TimedOut(ms))) => Err(ExecError::Timeout(ms)),
            Some(Termination::Cancelled(CancelReason::OutputLimit(max))) => {
                Err(ExecError::OutputLimitExceeded(max))
            }
            Some(Termination::WaitFailed(msg)) => Err(ExecError::Wait(msg)),
            None => Err(ExecError::Wait("process monitor went away".to_string())),
        }
    }
}
