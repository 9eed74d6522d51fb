//! User commands backed by an external executable.
//!
//! ## Manifest
//!
//! One TOML file per command in the user command directory:
//!
//! ```toml
//! command = ["volume", "v"]      # optional; defaults to the file stem
//! help = "Volume helpers"        # optional
//! alias_help = { v = "Alias for \"volume\"" }
//! executable = "bin/dkr-volume"  # relative to the manifest's directory
//! args = ["--from-dkr"]          # optional; passed before the user's arguments
//! ```
//!
//! ## Protocol
//!
//! **argv**: the manifest `args`, then every argument after the command name.
//!
//! **stdin** (JSON): `{"command": <invoked name>, "args": [...], "state": {...}}`.
//!
//! **env**: `DKR_COMMAND` (invoked name), `DKR_STATE_OUT` (file path), `DKR_HOME`.
//!
//! **stdout/stderr**: inherited.
//!
//! **state**: a JSON object written to `$DKR_STATE_OUT` is merged into session state;
//! `null` values delete keys.
//!
//! **exit code**: 0 is success, 1 an input error, anything else an engine error.

use super::{CommandContext, CommandModule, Namespace, DEFAULT_HELP};
use crate::engine::EngineClient;
use crate::error::DkrError;
use crate::state::SessionState;
use clap::{Arg, ArgAction, ArgMatches};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const COMMAND_ENV: &str = "DKR_COMMAND";
pub const STATE_OUT_ENV: &str = "DKR_STATE_OUT";

const ARGS_ID: &str = "args";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandNames {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandManifest {
    #[serde(default)]
    pub command: Option<CommandNames>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub alias_help: BTreeMap<String, String>,
    pub executable: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExternalCommand {
    names: Vec<String>,
    help: Option<String>,
    alias_help: BTreeMap<String, String>,
    executable: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl ExternalCommand {
    pub fn from_manifest(path: &Path) -> Result<Self, DkrError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DkrError::Plugin(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let manifest: CommandManifest = toml::from_str(&content).map_err(|e| {
            DkrError::Plugin(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DkrError::Plugin(format!("Invalid manifest name: {:?}", path)))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_parts(manifest, stem, base)
    }

    fn from_parts(manifest: CommandManifest, stem: &str, base: &Path) -> Result<Self, DkrError> {
        let names = match manifest.command {
            None => vec![stem.to_string()],
            Some(CommandNames::One(name)) => vec![name],
            Some(CommandNames::Many(names)) => names,
        };
        if names.is_empty() || names.iter().any(|n| n.trim().is_empty()) {
            return Err(DkrError::Plugin(format!(
                "Command names must not be empty in {}.toml",
                stem
            )));
        }

        let executable = if manifest.executable.is_absolute() {
            manifest.executable
        } else {
            base.join(manifest.executable)
        };

        Ok(Self {
            names,
            help: manifest.help,
            alias_help: manifest.alias_help,
            executable,
            args: manifest.args,
            working_dir: base.to_path_buf(),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run the executable for `invoked_as` and fold any state it hands back.
    pub fn run(
        &self,
        invoked_as: &str,
        args: &[String],
        state: &mut SessionState,
    ) -> Result<(), DkrError> {
        let state_out = state_out_path(invoked_as);
        let payload = json!({
            "command": invoked_as,
            "args": args,
            "state": Value::Object(state.as_map().clone()),
        });

        let mut command = Command::new(&self.executable);
        command
            .args(&self.args)
            .args(args)
            .current_dir(&self.working_dir)
            .env(COMMAND_ENV, invoked_as)
            .env(STATE_OUT_ENV, &state_out)
            .stdin(Stdio::piped());
        if let Ok(home) = crate::config::paths::dkr_home() {
            command.env(crate::config::paths::DKR_HOME_ENV, home);
        }

        debug!(command = invoked_as, executable = %self.executable.display(), "Running user command");
        let mut child = command.spawn().map_err(|e| {
            DkrError::Plugin(format!(
                "Failed to run {}: {}",
                self.executable.display(),
                e
            ))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Commands that never read stdin may already have exited.
            if let Err(e) = stdin.write_all(payload.to_string().as_bytes()) {
                debug!(command = invoked_as, "Could not write command input: {}", e);
            }
        }

        let status = child.wait().map_err(|e| {
            DkrError::Plugin(format!("Failed to wait for {}: {}", invoked_as, e))
        })?;
        merge_state_out(&state_out, state);

        match status.code() {
            Some(0) => Ok(()),
            Some(1) => Err(DkrError::invalid_input(format!(
                "{} exited with status 1",
                invoked_as
            ))),
            Some(code) => Err(DkrError::Plugin(format!(
                "{} exited with status {}",
                invoked_as, code
            ))),
            None => Err(DkrError::Plugin(format!(
                "{} was terminated by a signal",
                invoked_as
            ))),
        }
    }
}

impl CommandModule for ExternalCommand {
    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn help_summary(&self, invoked_as: &str) -> String {
        self.alias_help
            .get(invoked_as)
            .or(self.help.as_ref())
            .cloned()
            .unwrap_or_else(|| DEFAULT_HELP.to_string())
    }

    fn register(
        &self,
        _engine: &dyn EngineClient,
        namespace: &mut Namespace,
        _state: &mut SessionState,
    ) -> Result<(), DkrError> {
        namespace.configure(|command| {
            command
                .disable_help_flag(true)
                .arg(
                    Arg::new(ARGS_ID)
                        .action(ArgAction::Append)
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                )
        });

        let command = self.clone();
        let invoked_as = namespace.name().to_string();
        namespace.set_default(move |ctx: &mut CommandContext<'_>, matches: &ArgMatches| {
            let args: Vec<String> = matches
                .get_many::<String>(ARGS_ID)
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            ctx.out.flush()?;
            command.run(&invoked_as, &args, ctx.state)
        });
        Ok(())
    }
}

fn state_out_path(invoked_as: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let file = format!(
        "dkr-{}-{}-{}.json",
        invoked_as.replace(std::path::is_separator, "_"),
        std::process::id(),
        nanos
    );
    std::env::temp_dir().join(file)
}

fn merge_state_out(path: &Path, state: &mut SessionState) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return,
    };
    if let Err(e) = std::fs::remove_file(path) {
        debug!("Failed to remove {}: {}", path.display(), e);
    }
    if content.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(updates)) => state.extend(updates),
        Ok(_) => warn!("Ignoring state from {}: not a JSON object", path.display()),
        Err(e) => warn!("Ignoring state from {}: {}", path.display(), e),
    }
}
