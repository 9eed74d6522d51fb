//! CLI parse: global flags for dkr. Resource commands are added at runtime by the
//! command registry.

use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Extensible Docker CLI Client
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dkr")]
#[command(about = "Extensible Docker CLI Client", version)]
pub struct Cli {
    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Engine endpoint, e.g. unix:///var/run/docker.sock or tcp://host:2375
    #[arg(long)]
    pub host: Option<String>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Read the global flags that precede the command. The full command tree needs
    /// configuration and session state to build, so this runs first and never fails:
    /// anything it cannot make sense of is left for the full parse to report.
    pub fn pre_parse<I, T>(args: I) -> Cli
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command = Cli::command()
            .disable_help_flag(true)
            .disable_version_flag(true)
            .allow_external_subcommands(true)
            .ignore_errors(true);
        command
            .try_get_matches_from(args)
            .ok()
            .and_then(|matches| Cli::from_arg_matches(&matches).ok())
            .unwrap_or_default()
    }
}
