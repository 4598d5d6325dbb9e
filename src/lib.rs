// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod supervisor;
pub mod types;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::load_and_validate;
use crate::events::SupervisorEvent;
use crate::exec::OutputHandler;
use crate::types::StreamKind;

pub use crate::config::ExecOptions;
pub use crate::errors::ExecError;
pub use crate::exec::ProcessController;
pub use crate::supervisor::{Execution, Supervisor};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the supervisor and its event subscriber
/// - Ctrl-C handling
///
/// Returns the exit code the binary should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let base = load_options(args.config.as_deref())?;
    let supervisor = Supervisor::new();
    spawn_event_logger(&supervisor);

    // Ctrl-C → stop everything we started.
    {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; stopping all processes");
            supervisor.stop_all();
        });
    }

    match args.command {
        Command::Exec { command, timeout_ms } => {
            let mut options = base;
            if let Some(ms) = timeout_ms {
                options.timeout_ms = ms;
            }
            let output = supervisor
                .execute(&command, &options)
                .await
                .with_context(|| format!("running '{command}'"))?;
            print!("{output}");
            std::io::stdout().flush()?;
            Ok(0)
        }
        Command::Stream {
            command,
            args: cmd_args,
            timeout_ms,
            filter,
            no_shell,
        } => {
            let mut options = base;
            if let Some(ms) = timeout_ms {
                options.timeout_ms = ms;
            }
            if no_shell {
                options.shell = false;
            }
            let filter = filter
                .map(|f| Regex::new(&f).with_context(|| format!("invalid --filter regex '{f}'")))
                .transpose()?;

            let execution = supervisor
                .realtime_execution(&command, &cmd_args, &options, Some(print_handler(filter)))
                .await
                .with_context(|| format!("starting '{command}'"))?;

            let Some(controller) = execution.into_controller() else {
                return Ok(0);
            };
            info!(id = %controller.id(), "streaming started");

            let code = controller.wait().await?;
            debug!(id = %controller.id(), ?code, "streaming finished");
            Ok(code.unwrap_or(1))
        }
    }
}

fn load_options(path: Option<&Path>) -> Result<ExecOptions> {
    match path {
        Some(path) => {
            let cfg = load_and_validate(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok(cfg.exec)
        }
        None => Ok(ExecOptions::default()),
    }
}

/// Print streamed output to our own stdout / stderr, optionally keeping only
/// the lines that match `filter`.
fn print_handler(filter: Option<Regex>) -> Arc<dyn OutputHandler> {
    let filter = Arc::new(filter);
    Arc::new(move |chunk: String, stream: StreamKind| {
        let filter = Arc::clone(&filter);
        async move {
            let text = match filter.as_ref() {
                Some(re) => chunk
                    .lines()
                    .filter(|line| re.is_match(line))
                    .map(|line| format!("{line}\n"))
                    .collect::<String>(),
                None => chunk,
            };
            if text.is_empty() {
                return Ok::<(), anyhow::Error>(());
            }
            match stream {
                StreamKind::Stdout => {
                    let mut out = std::io::stdout().lock();
                    out.write_all(text.as_bytes())?;
                    out.flush()?;
                }
                StreamKind::Stderr => {
                    let mut err = std::io::stderr().lock();
                    err.write_all(text.as_bytes())?;
                }
            }
            Ok(())
        }
    })
}

/// Forward supervisor events to the log.
fn spawn_event_logger(supervisor: &Supervisor) {
    let mut events = supervisor.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SupervisorEvent::Error { id, message }) => {
                    error!(id = ?id.map(|i| i.to_string()), "{message}");
                }
                Ok(SupervisorEvent::Warning { id, message }) => {
                    warn!(id = ?id.map(|i| i.to_string()), "{}", message.trim_end());
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event logger lagged behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
