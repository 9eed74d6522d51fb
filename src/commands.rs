//! Built-in command modules.
//!
//! Handlers translate parsed arguments into engine calls and session-state updates. They
//! write to the context's `out`/`err` streams rather than the process streams.

use crate::cli::presentation::DumpFormat;
use crate::registry::{CommandModule, Namespace};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::rc::Rc;

pub mod batch;
pub mod container;
pub mod image;

pub use batch::{worst_severity, BatchReport, ItemOutcome};
pub use container::ContainerCommands;
pub use image::ImageCommands;

/// The compiled-in command table.
pub fn builtin_modules() -> Vec<Rc<dyn CommandModule>> {
    vec![Rc::new(ContainerCommands), Rc::new(ImageCommands)]
}

/// Bind the usage hint shown when a noun is given without a verb.
fn set_usage_default(namespace: &mut Namespace) {
    let noun = namespace.name().to_string();
    namespace.set_default(move |ctx, _| {
        writeln!(
            ctx.err,
            "No valid command specified. `{} {} -h` for help.",
            ctx.program, noun
        )?;
        Ok(())
    });
}

fn with_dump_flags(command: Command) -> Command {
    command
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Render all as json"),
        )
        .arg(
            Arg::new("pprint")
                .long("pprint")
                .action(ArgAction::SetTrue)
                .help("Dump contents in the raw debug form"),
        )
}

fn dump_format(matches: &ArgMatches) -> DumpFormat {
    DumpFormat::from_flags(matches.get_flag("json"), matches.get_flag("pprint"))
}

fn flag(id: &'static str, short: Option<char>, long: &'static str, help: &'static str) -> Arg {
    let arg = Arg::new(id)
        .long(long)
        .action(ArgAction::SetTrue)
        .help(help);
    match short {
        Some(c) => arg.short(c),
        None => arg,
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn string_args(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
