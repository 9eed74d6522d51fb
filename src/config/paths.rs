//! Per-user filesystem locations.

use crate::error::DkrError;
use directories::BaseDirs;
use std::path::PathBuf;

/// Environment variable that relocates the dkr home directory.
pub const DKR_HOME_ENV: &str = "DKR_HOME";

/// `$DKR_HOME`, or `<home>/.dkr`.
pub fn dkr_home() -> Result<PathBuf, DkrError> {
    if let Ok(dir) = std::env::var(DKR_HOME_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".dkr"))
        .ok_or_else(|| DkrError::Config("Unable to determine home directory".to_string()))
}

pub fn default_state_file() -> Result<PathBuf, DkrError> {
    Ok(dkr_home()?.join("state.json"))
}

pub fn default_commands_dir() -> Result<PathBuf, DkrError> {
    Ok(dkr_home()?.join("commands"))
}

pub fn default_config_file() -> Result<PathBuf, DkrError> {
    Ok(dkr_home()?.join("config.toml"))
}
