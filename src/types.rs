// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Opaque identifier for a supervised process.
///
/// Identifiers are handed out from a monotonically increasing counter, so
/// they never collide within the lifetime of a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl ProcessId {
    pub(crate) fn new(raw: u64) -> Self {
        ProcessId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proc-{}", self.0)
    }
}

/// Which output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How raw output bytes are turned into text.
///
/// - `Utf8`: lossy UTF-8; a multibyte sequence split across two chunks is
///   held back until the rest of it arrives.
/// - `Latin1`: every byte maps to the code point of the same value.
/// - `Ascii`: the high bit of every byte is dropped.
/// - `Hex`: lowercase hex, two characters per byte.
/// - `Base64`: standard alphabet with padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "binary")]
    Latin1,
    Ascii,
    Hex,
    Base64,
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(OutputEncoding::Utf8),
            "latin1" | "binary" => Ok(OutputEncoding::Latin1),
            "ascii" => Ok(OutputEncoding::Ascii),
            "hex" => Ok(OutputEncoding::Hex),
            "base64" => Ok(OutputEncoding::Base64),
            other => Err(format!(
                "invalid encoding: {other} (expected utf8, latin1, ascii, hex or base64)"
            )),
        }
    }
}
