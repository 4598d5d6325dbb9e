// src/config/model.rs

use serde::Deserialize;

use crate::types::OutputEncoding;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [exec]
/// shell = true
/// encoding = "utf8"
/// max_buffer = 104857600
/// timeout_ms = 0
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub exec: ExecOptions,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub exec: ExecOptions,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(exec: ExecOptions) -> Self {
        Self { exec }
    }
}

/// Options for a single execution, also the `[exec]` config section.
///
/// Immutable once handed to the supervisor; each call takes its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecOptions {
    /// Run through `sh -c` (`cmd /C` on Windows), joining command and args
    /// with spaces. When `false` the command is executed directly.
    #[serde(default = "default_shell")]
    pub shell: bool,

    #[serde(default)]
    pub encoding: OutputEncoding,

    /// Maximum bytes captured per stream in buffered runs.
    #[serde(default = "default_max_buffer")]
    pub max_buffer: usize,

    /// Timeout in milliseconds; `0` means unbounded.
    #[serde(default)]
    pub timeout_ms: u64,
}

pub const DEFAULT_MAX_BUFFER: usize = 100 * 1024 * 1024;

fn default_shell() -> bool {
    true
}

fn default_max_buffer() -> usize {
    DEFAULT_MAX_BUFFER
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            encoding: OutputEncoding::default(),
            max_buffer: default_max_buffer(),
            timeout_ms: 0,
        }
    }
}

impl ExecOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    /// The timeout as a `Duration`, or `None` when unbounded.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}
