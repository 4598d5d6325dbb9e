// src/exec/mod.rs

//! Process execution layer.
//!
//! This module actually runs commands with `tokio::process::Command` and
//! keeps track of them while they live.
//!
//! - [`spawn`] builds and spawns the OS process (shell or direct).
//! - [`registry`] maps live process ids to their registry entries.
//! - [`termination`] is the per-process "stop now" signal and its reason.
//! - [`runner`] owns each child until it terminates (exit, stop, timeout).
//! - [`stream`] reads stdout/stderr, either delivering chunks to a
//!   [`handler::OutputHandler`] or capturing them for buffered runs.
//! - [`decode`] turns raw chunks into text in the configured encoding.
//! - [`controller`] is the caller-facing handle of a streaming run.

pub mod controller;
pub mod decode;
pub mod handler;
pub mod registry;
pub mod runner;
pub mod spawn;
pub mod stream;
pub mod termination;

pub use controller::ProcessController;
pub use handler::{HandlerFuture, OutputHandler};
pub use registry::{ProcessInfo, ProcessRegistry};
pub use termination::CancelReason;
