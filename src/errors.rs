// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::{ProcessId, StreamKind};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exited with code {code}{}", stderr_suffix(.stderr))]
    ProcessFailed { code: i32, stderr: String },

    #[error("command timed out after {0}ms")]
    Timeout(u64),

    #[error("callback error on {stream} chunk: {reason}")]
    CallbackFailed { stream: StreamKind, reason: String },

    #[error("failed to stop process {id}: {reason}")]
    StopFailed { id: ProcessId, reason: String },

    #[error("process was terminated before it exited on its own")]
    Terminated,

    #[error("output exceeded max buffer of {0} bytes")]
    OutputLimitExceeded(usize),

    /// Carries a message rather than the `io::Error`: the outcome is shared
    /// by every clone of a controller.
    #[error("waiting for process failed: {0}")]
    Wait(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    /// Exit code carried by a `ProcessFailed` error, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::ProcessFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failed_display_includes_trimmed_stderr() {
        let err = ExecError::ProcessFailed {
            code: 2,
            stderr: "no such file\n".to_string(),
        };
        assert_eq!(err.to_string(), "process exited with code 2: no such file");
        assert_eq!(err.exit_code(), Some(2));
    }

    #[test]
    fn process_failed_display_without_stderr() {
        let err = ExecError::ProcessFailed {
            code: 1,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "process exited with code 1");
    }

    #[test]
    fn wait_failure_displays_os_message() {
        let err = ExecError::Wait("No child processes (os error 10)".to_string());
        assert_eq!(
            err.to_string(),
            "waiting for process failed: No child processes (os error 10)"
        );
        assert_eq!(err.exit_code(), None);
    }
}
