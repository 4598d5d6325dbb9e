// src/config/mod.rs

//! Configuration loading and validation for cmdexec.
//!
//! - `model.rs` defines the TOML-backed data model and `ExecOptions`.
//! - `loader.rs` loads a config file from disk.
//! - `validate.rs` checks basic invariants.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, DEFAULT_MAX_BUFFER, ExecOptions, RawConfigFile};
pub use validate::validate_config;
