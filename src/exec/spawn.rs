// src/exec/spawn.rs

//! Building and spawning the OS process.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{ExecError, Result};

/// Command line as shown in logs and `ProcessInfo`: command and args joined
/// by spaces, which is also exactly what the shell receives.
pub fn command_line(command: &str, args: &[String]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn build_command(command: &str, args: &[String], shell: bool) -> Command {
    let mut cmd = if !shell {
        let mut c = Command::new(command);
        c.args(args);
        c
    } else if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line(command, args));
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line(command, args));
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn `command` with piped stdout/stderr.
///
/// Failures to create the process (missing executable, permissions) map to
/// `SpawnFailed`. With `shell = true` a missing command is reported by the
/// shell instead, as a non-zero exit.
pub fn spawn_child(command: &str, args: &[String], shell: bool) -> Result<Child> {
    let line = command_line(command, args);
    debug!(cmd = %line, shell, "building process command");

    let child = build_command(command, args, shell)
        .spawn()
        .map_err(|source| ExecError::SpawnFailed {
            command: line.clone(),
            source,
        })?;

    info!(cmd = %line, pid = ?child.id(), "spawned process");
    Ok(child)
}
