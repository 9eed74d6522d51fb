//! Dkr CLI Binary
//!
//! Command-line client for container engines with pluggable resource commands.

use dkr::cli::{load_config, Cli, RunContext};
use dkr::config::DkrConfig;
use dkr::logging::{init_logging, LoggingConfig};
use std::io::{self, IsTerminal};
use std::process;
use tracing::{error, info};

fn main() {
    let args: Vec<_> = std::env::args_os().collect();
    let cli = Cli::pre_parse(args.iter().cloned());

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", dkr::cli::map_error(&e));
            process::exit(dkr::cli::exit_code(&e));
        }
    };

    // Build logging config from CLI args and config file
    let logging_config = build_logging_config(&cli, &config);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Dkr CLI starting");

    let context = match RunContext::new(config) {
        Ok(ctx) => ctx.with_color(io::stderr().is_terminal()),
        Err(e) => {
            error!("Error connecting to engine: {}", e);
            eprintln!("{}", dkr::cli::map_error(&e));
            process::exit(dkr::cli::exit_code(&e));
        }
    };

    let code = {
        let stdout = io::stdout();
        let stderr = io::stderr();
        let mut out = stdout.lock();
        let mut err = stderr.lock();
        context.execute(args, &mut out, &mut err)
    };
    drop(context);
    process::exit(code);
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &DkrConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    logging
}
