//! CLI domain: parse, route, output, and presentation only.
//! Resource commands live in the command modules; this layer wires them to the process.

mod output;
mod parse;
pub mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::Cli;
pub use route::{load_config, RunContext};
