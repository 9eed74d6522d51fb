//! CLI route: run context. Loads session state, builds the command tree from the registry,
//! dispatches one invocation, and persists state on the way out.

use crate::cli::output::{exit_code, map_error};
use crate::cli::parse::Cli;
use crate::config::{ConfigLoader, DkrConfig};
use crate::engine::{DockerEngine, EngineClient};
use crate::error::{DkrError, EXIT_INPUT};
use crate::registry::{CommandContext, CommandRegistry};
use crate::state::{SessionState, StateStore};
use clap::CommandFactory;
use std::ffi::OsString;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Load configuration as selected by the global flags; `--host` overrides the file.
pub fn load_config(cli: &Cli) -> Result<DkrConfig, DkrError> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(host) = &cli.host {
        config.engine.host = Some(host.clone());
    }
    Ok(config)
}

/// Runtime context for CLI execution: configuration and the engine client.
pub struct RunContext {
    config: DkrConfig,
    engine: Box<dyn EngineClient>,
    program: String,
    color: bool,
}

impl RunContext {
    /// Create run context backed by the Docker engine named in `config`.
    pub fn new(config: DkrConfig) -> Result<Self, DkrError> {
        let engine = DockerEngine::connect(&config.engine)?;
        Ok(Self::with_engine(config, Box::new(engine)))
    }

    pub fn with_engine(config: DkrConfig, engine: Box<dyn EngineClient>) -> Self {
        Self {
            config,
            engine,
            program: "dkr".to_string(),
            color: false,
        }
    }

    /// Color stderr warnings.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn config(&self) -> &DkrConfig {
        &self.config
    }

    /// Parse `args` (program name first) and run the selected command. Returns the
    /// process exit code; session state has been saved by the time this returns.
    pub fn execute<I, T>(&self, args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let state_file = match self.config.state_file() {
            Ok(path) => path,
            Err(e) => return report(err, &e),
        };
        let mut state = match StateStore::new(state_file).open() {
            Ok(state) => state,
            Err(e) => return report(err, &e),
        };

        let code = self.run_command(args, &mut state, &mut *out, &mut *err);

        if let Err(e) = state.persist() {
            warn!("Failed to save session state: {}", e);
            let _ = writeln!(err, "{}", map_error(&e));
        } else {
            debug!("Session state saved");
        }
        code
    }

    /// Build the command tree against `state`, parse, and dispatch. Returns the exit code.
    fn run_command<I, T>(
        &self,
        args: I,
        state: &mut SessionState,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let registry = match self.config.user_commands_dir() {
            Ok(dir) => CommandRegistry::load(&dir),
            Err(e) => {
                warn!("User commands unavailable: {}", e);
                CommandRegistry::new()
            }
        };
        let mut tree = match registry.build_tree(Cli::command(), self.engine.as_ref(), state) {
            Ok(tree) => tree,
            Err(e) => return report(err, &e),
        };

        let matches = match tree.parse(args) {
            Ok(matches) => matches,
            Err(parse_error) => {
                let rendered = parse_error.render().to_string();
                return if parse_error.use_stderr() {
                    let _ = write!(err, "{}", rendered);
                    EXIT_INPUT
                } else {
                    let _ = write!(out, "{}", rendered);
                    0
                };
            }
        };

        let result = {
            let mut ctx = CommandContext {
                engine: self.engine.as_ref(),
                state,
                out: &mut *out,
                err: &mut *err,
                program: &self.program,
                color: self.color,
            };
            tree.dispatch(&matches, &mut ctx)
        };
        let _ = out.flush();

        match result {
            Ok(()) => {
                info!("Command completed successfully");
                0
            }
            Err(e) => report(err, &e),
        }
    }
}

fn report(err: &mut dyn Write, e: &DkrError) -> i32 {
    error!("Command failed: {}", e);
    // Batch items have already written their own messages.
    if !matches!(e, DkrError::Batch { .. }) {
        let _ = writeln!(err, "{}", map_error(e));
    }
    exit_code(e)
}
