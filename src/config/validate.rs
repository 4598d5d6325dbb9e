// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ExecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.exec))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    // encoding is strongly typed and rejected during deserialization.
    if cfg.exec.max_buffer == 0 {
        return Err(ExecError::ConfigError(
            "[exec].max_buffer must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
