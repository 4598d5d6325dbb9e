// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `cmdexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cmdexec",
    version,
    about = "Run commands once or stream their output in real time.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML config file with an `[exec]` section of defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMDEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a shell command line to completion and print its stdout.
    Exec {
        /// The full command line, passed to the shell as-is.
        command: String,

        /// Kill the command after this many milliseconds (0 = no limit).
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Run a command and print its output as it arrives.
    Stream {
        command: String,

        /// Arguments passed to the command.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Kill the command after this many milliseconds (0 = no limit).
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Only print output lines matching this regex.
        #[arg(long, value_name = "REGEX")]
        filter: Option<String>,

        /// Execute the command directly instead of through the shell.
        #[arg(long)]
        no_shell: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
