//! Configuration System
//!
//! Layered configuration for the client: built-in defaults, then the optional
//! `config.toml` in the dkr home directory, then `DKR_*` environment variables.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DkrConfig {
    /// Container engine connection settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Session state persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Command module discovery
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Endpoint URL (`unix://`, `tcp://`, `http://`). Engine defaults apply when unset.
    #[serde(default)]
    pub host: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

fn default_engine_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: None,
            timeout_secs: default_engine_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Session state document; defaults to `<dkr home>/state.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// User command manifests; defaults to `<dkr home>/commands`
    #[serde(default)]
    pub user_dir: Option<PathBuf>,
}

impl DkrConfig {
    /// Resolved session state path.
    pub fn state_file(&self) -> Result<PathBuf, crate::error::DkrError> {
        match &self.state.file {
            Some(path) => Ok(path.clone()),
            None => paths::default_state_file(),
        }
    }

    /// Resolved user command directory.
    pub fn user_commands_dir(&self) -> Result<PathBuf, crate::error::DkrError> {
        match &self.commands.user_dir {
            Some(path) => Ok(path.clone()),
            None => paths::default_commands_dir(),
        }
    }
}
