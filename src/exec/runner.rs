// src/exec/runner.rs

//! Monitor tasks that own a spawned child until it terminates.
//!
//! The monitor races three things: the child exiting with its output
//! streams closed, the termination signal (explicit stop or output limit)
//! and the optional timeout. Whichever path wins, the registry entry is
//! removed before the outcome is published, so `is_process_running` is
//! already `false` by the time a caller observes the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::errors::ExecError;
use crate::events::EventBus;
use crate::exec::registry::ProcessRegistry;
use crate::exec::termination::{CancelReason, TerminationSignal};
use crate::types::{ProcessId, StreamKind};

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own; `None` if it was killed by a signal we did not send.
    Exited(Option<i32>),
    /// Killed by the supervisor.
    Cancelled(CancelReason),
    /// Waiting on the child failed at the OS level.
    WaitFailed(String),
}

/// Raw result of a buffered run.
#[derive(Debug)]
pub struct BufferedOutcome {
    pub termination: Termination,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Shared state handed to every monitor.
#[derive(Clone)]
pub struct Monitor {
    pub id: ProcessId,
    pub registry: Arc<ProcessRegistry>,
    pub events: EventBus,
    pub signal: Arc<TerminationSignal>,
    pub timeout: Option<Duration>,
}

impl Monitor {
    /// Wait for `child` to terminate and for `streams` (the tasks reading
    /// its output) to reach end of file.
    ///
    /// A background grandchild can keep the pipes open after the child
    /// itself has exited, so the entry stays registered, and the timeout
    /// stays armed, until both are done. The streams' output is only
    /// returned when the run was not cancelled.
    pub async fn supervise<F, T>(&self, mut child: Child, streams: F) -> (Termination, Option<T>)
    where
        F: Future<Output = T>,
    {
        let timer = async {
            match self.timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let finished = {
            let work = async { tokio::join!(child.wait(), streams) };
            tokio::select! {
                biased;
                _ = self.signal.cancelled() => None,
                _ = timer => {
                    let ms = self.timeout.map(|d| d.as_millis() as u64).unwrap_or_default();
                    if self.signal.cancel(CancelReason::TimedOut(ms)) {
                        warn!(id = %self.id, timeout_ms = ms, "process timed out; killing");
                    }
                    None
                }
                done = work => Some(done),
            }
        };

        match finished {
            Some((Ok(status), output)) => {
                self.registry.remove(self.id);
                info!(
                    id = %self.id,
                    exit_code = ?status.code(),
                    success = status.success(),
                    "process exited"
                );
                (Termination::Exited(status.code()), Some(output))
            }
            Some((Err(e), output)) => {
                self.registry.remove(self.id);
                error!(id = %self.id, error = %e, "waiting for process failed");
                (Termination::WaitFailed(e.to_string()), Some(output))
            }
            None => {
                // Explicit stop already removed the entry; timeout and
                // output limit have not.
                self.registry.remove(self.id);
                let reason = self.signal.reason().unwrap_or(CancelReason::Stopped);
                match child.try_wait() {
                    Ok(Some(status)) => debug!(
                        id = %self.id,
                        exit_code = ?status.code(),
                        "process already exited; abandoning its open output streams"
                    ),
                    _ => self.kill(&mut child).await,
                }
                (Termination::Cancelled(reason), None)
            }
        }
    }

    async fn kill(&self, child: &mut Child) {
        match child.start_kill() {
            Ok(()) => {
                debug!(id = %self.id, "termination signal sent");
                if let Err(e) = child.wait().await {
                    debug!(id = %self.id, error = %e, "reaping killed process failed");
                }
            }
            Err(e) => {
                let err = ExecError::StopFailed {
                    id: self.id,
                    reason: e.to_string(),
                };
                warn!(error = %err, "could not deliver termination signal");
                self.events.error(Some(self.id), err.to_string());
            }
        }
    }
}

/// Monitor a streaming execution in the background.
///
/// Every chunk reaches the handler before the outcome is published. After a
/// cancellation the reader tasks are left to notice the signal on their own
/// and stop delivering.
pub fn spawn_streaming(
    monitor: Monitor,
    child: Child,
    readers: Vec<JoinHandle<()>>,
) -> watch::Receiver<Option<Termination>> {
    let (done_tx, done_rx) = watch::channel(None);

    tokio::spawn(async move {
        let id = monitor.id;
        let drained = async move {
            for reader in readers {
                if let Err(e) = reader.await {
                    warn!(id = %id, error = %e, "output reader task failed");
                }
            }
        };
        let (termination, _) = monitor.supervise(child, drained).await;

        // Nobody awaits the launch call any more, so report it here too.
        if let Termination::Cancelled(CancelReason::TimedOut(ms)) = termination {
            monitor
                .events
                .error(Some(monitor.id), ExecError::Timeout(ms).to_string());
        }

        debug!(id = %monitor.id, ?termination, "publishing termination");
        done_tx.send_replace(Some(termination));
    });

    done_rx
}

/// Monitor a buffered execution in the background and hand back the
/// captured output once the process is gone.
pub fn spawn_buffered(
    monitor: Monitor,
    child: Child,
    stdout: JoinHandle<Vec<u8>>,
    stderr: JoinHandle<Vec<u8>>,
) -> oneshot::Receiver<BufferedOutcome> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let id = monitor.id;
        let captured = async move {
            let (stdout, stderr) = tokio::join!(stdout, stderr);
            (
                captured_or_empty(id, StreamKind::Stdout, stdout),
                captured_or_empty(id, StreamKind::Stderr, stderr),
            )
        };
        let (termination, captured) = monitor.supervise(child, captured).await;
        let (stdout, stderr) = captured.unwrap_or_default();

        let outcome = BufferedOutcome {
            termination,
            stdout,
            stderr,
        };
        if tx.send(outcome).is_err() {
            debug!(id = %monitor.id, "buffered caller went away before completion");
        }
    });

    rx
}

fn captured_or_empty(
    id: ProcessId,
    stream: StreamKind,
    joined: std::result::Result<Vec<u8>, JoinError>,
) -> Vec<u8> {
    joined.unwrap_or_else(|e| {
        warn!(id = %id, %stream, error = %e, "capture task failed");
        Vec::new()
    })
}
