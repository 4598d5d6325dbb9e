// src/supervisor.rs

//! The process supervisor.
//!
//! A [`Supervisor`] launches child processes, tracks them in a
//! [`ProcessRegistry`] by [`ProcessId`], and reports non-fatal diagnostics
//! on its event channel. It is cheap to clone; clones share the registry
//! and the event channel.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ExecOptions;
use crate::errors::{ExecError, Result};
use crate::events::{DEFAULT_EVENT_CAPACITY, EventBus, SupervisorEvent};
use crate::exec::controller::ProcessController;
use crate::exec::decode::decode_all;
use crate::exec::handler::OutputHandler;
use crate::exec::registry::{ProcessEntry, ProcessInfo, ProcessRegistry};
use crate::exec::runner::{self, BufferedOutcome, Monitor, Termination};
use crate::exec::spawn::{command_line, spawn_child};
use crate::exec::stream::{DeliveryContext, capture_stream, deliver_stream};
use crate::exec::termination::{CancelReason, TerminationSignal};
use crate::types::{ProcessId, StreamKind};

/// Result of [`Supervisor::realtime_execution`].
#[derive(Debug)]
pub enum Execution {
    /// A handler was supplied; output is being streamed to it.
    Streaming(ProcessController),
    /// No handler; the process ran to completion and this is its stdout.
    Buffered(String),
}

impl Execution {
    pub fn into_controller(self) -> Option<ProcessController> {
        match self {
            Execution::Streaming(c) => Some(c),
            Execution::Buffered(_) => None,
        }
    }

    pub fn into_output(self) -> Option<String> {
        match self {
            Execution::Buffered(s) => Some(s),
            Execution::Streaming(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Supervisor {
    registry: Arc<ProcessRegistry>,
    events: EventBus,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(ProcessRegistry::new()),
            events: EventBus::new(capacity),
        }
    }

    /// Subscribe to `error` / `warning` events.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.events.subscribe()
    }

    /// Run a shell command line to completion and return its stdout.
    ///
    /// The command always goes through the shell, whatever `options.shell`
    /// says. A non-zero exit fails with `ProcessFailed` carrying the exit
    /// code and captured stderr; stderr output on a zero exit is reported as
    /// a `warning` event instead.
    pub async fn execute(&self, command: &str, options: &ExecOptions) -> Result<String> {
        let options = options.clone().with_shell(true);
        self.run_buffered(command, &[], &options)
            .await
            .inspect_err(|e| {
                self.events
                    .error(None, format!("One-time execution error: {e}"))
            })
    }

    /// Launch `command` and stream its output to `handler`.
    ///
    /// With a handler, this returns as soon as the process is registered;
    /// the exit code is available through the returned controller. Without
    /// one it behaves like [`Supervisor::execute`] (honouring
    /// `options.shell` and `args`).
    pub async fn realtime_execution(
        &self,
        command: &str,
        args: &[String],
        options: &ExecOptions,
        handler: Option<Arc<dyn OutputHandler>>,
    ) -> Result<Execution> {
        let result = match handler {
            Some(handler) => self
                .launch_streaming(command, args, options, handler)
                .map(Execution::Streaming),
            None => self
                .run_buffered(command, args, options)
                .await
                .map(Execution::Buffered),
        };

        result.inspect_err(|e| self.events.error(None, format!("Execution error: {e}")))
    }

    /// Send a termination signal to `id` and drop it from the registry.
    ///
    /// Returns whether an entry existed; a second call for the same id
    /// returns `false`.
    pub fn stop_process(&self, id: ProcessId) -> bool {
        match self.registry.remove(id) {
            Some(entry) => {
                info!(id = %id, cmd = %entry.info.command, "stopping process");
                entry.signal.cancel(CancelReason::Stopped);
                true
            }
            None => {
                debug!(id = %id, "stop requested for unknown or finished process");
                false
            }
        }
    }

    pub fn is_process_running(&self, id: ProcessId) -> bool {
        self.registry.contains(id)
    }

    /// Stop every registered process. Returns how many were stopped.
    ///
    /// Kill failures surface as `StopFailed` error events from the
    /// individual monitors and never interrupt the loop.
    pub fn stop_all(&self) -> usize {
        let entries = self.registry.drain();
        let count = entries.len();
        for entry in entries {
            debug!(id = %entry.info.id, "stopping process (stop_all)");
            entry.signal.cancel(CancelReason::Stopped);
        }
        if count > 0 {
            info!(count, "stopped all running processes");
        }
        count
    }

    pub fn running_processes(&self) -> Vec<ProcessInfo> {
        self.registry.list()
    }

    pub fn running_count(&self) -> usize {
        self.registry.len()
    }

    fn launch_streaming(
        &self,
        command: &str,
        args: &[String],
        options: &ExecOptions,
        handler: Arc<dyn OutputHandler>,
    ) -> Result<ProcessController> {
        let (monitor, mut child) = self.spawn_registered(command, args, options)?;

        let ctx = DeliveryContext {
            id: monitor.id,
            encoding: options.encoding,
            handler,
            signal: monitor.signal.clone(),
            events: self.events.clone(),
        };

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(deliver_stream(
                stdout,
                StreamKind::Stdout,
                ctx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(deliver_stream(stderr, StreamKind::Stderr, ctx)));
        }

        let id = monitor.id;
        let done = runner::spawn_streaming(monitor, child, readers);
        Ok(ProcessController::new(id, self.clone(), done))
    }

    async fn run_buffered(
        &self,
        command: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<String> {
        let (monitor, mut child) = self.spawn_registered(command, args, options)?;
        let id = monitor.id;

        let stdout = spawn_capture(child.stdout.take(), StreamKind::Stdout, &monitor, options);
        let stderr = spawn_capture(child.stderr.take(), StreamKind::Stderr, &monitor, options);

        let outcome = runner::spawn_buffered(monitor, child, stdout, stderr)
            .await
            .map_err(|_| ExecError::Wait("process monitor went away".to_string()))?;

        self.finish_buffered(id, outcome, options)
    }

    fn finish_buffered(
        &self,
        id: ProcessId,
        outcome: BufferedOutcome,
        options: &ExecOptions,
    ) -> Result<String> {
        let stderr = decode_all(options.encoding, &outcome.stderr);

        match outcome.termination {
            Termination::Exited(Some(0)) => {
                if !stderr.is_empty() {
                    self.events.warning(Some(id), stderr);
                }
                Ok(decode_all(options.encoding, &outcome.stdout))
            }
            Termination::Exited(Some(code)) => Err(ExecError::ProcessFailed { code, stderr }),
            Termination::Exited(None) | Termination::Cancelled(CancelReason::Stopped) => {
                Err(ExecError::Terminated)
            }
            Termination::Cancelled(CancelReason::TimedOut(ms)) => Err(ExecError::Timeout(ms)),
            Termination::Cancelled(CancelReason::OutputLimit(max)) => {
                Err(ExecError::OutputLimitExceeded(max))
            }
            Termination::WaitFailed(msg) => Err(ExecError::Wait(msg)),
        }
    }

    /// Spawn the child and register it before any output is read.
    fn spawn_registered(
        &self,
        command: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<(Monitor, tokio::process::Child)> {
        let child = spawn_child(command, args, options.shell)?;

        let id = self.registry.generate_id();
        let signal = Arc::new(TerminationSignal::new());
        self.registry.insert(ProcessEntry {
            info: ProcessInfo {
                id,
                pid: child.id(),
                command: command_line(command, args),
                started_at: SystemTime::now(),
            },
            signal: signal.clone(),
        });

        if options.timeout().is_some() {
            debug!(id = %id, timeout_ms = options.timeout_ms, "timeout armed");
        }

        let monitor = Monitor {
            id,
            registry: self.registry.clone(),
            events: self.events.clone(),
            signal,
            timeout: options.timeout(),
        };
        Ok((monitor, child))
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_capture<R>(
    reader: Option<R>,
    stream: StreamKind,
    monitor: &Monitor,
    options: &ExecOptions,
) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let id = monitor.id;
    let signal = monitor.signal.clone();
    let max_buffer = options.max_buffer;
    tokio::spawn(async move {
        match reader {
            Some(r) => capture_stream(r, stream, id, max_buffer, signal).await,
            None => Vec::new(),
        }
    })
}
