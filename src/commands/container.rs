//! `container` (alias `c`): list, inspect, create, run, start, stop, rm.

use super::batch::{BatchReport, ItemOutcome};
use super::{
    dump_format, flag, now, set_usage_default, string_arg, string_args, with_dump_flags,
};
use crate::args::{OptionTree, PortBinding, VolumeBinding};
use crate::cli::presentation::{format_container_table, render_dump};
use crate::engine::{CreateContainerConfig, EngineClient, RemoveContainerFlags};
use crate::error::DkrError;
use crate::registry::{CommandContext, CommandModule, Namespace};
use crate::state::{resolve_container, resolve_image, SessionState, DEFAULT_STOP_TIME_SECS};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::io::Write;
use tracing::debug;

pub struct ContainerCommands;

impl CommandModule for ContainerCommands {
    fn names(&self) -> Vec<String> {
        vec!["container".to_string(), "c".to_string()]
    }

    fn help_summary(&self, invoked_as: &str) -> String {
        if invoked_as == "c" {
            "Alias for \"container\"".to_string()
        } else {
            "Various commands for containers".to_string()
        }
    }

    fn register(
        &self,
        _engine: &dyn EngineClient,
        namespace: &mut Namespace,
        state: &mut SessionState,
    ) -> Result<(), DkrError> {
        set_usage_default(namespace);
        namespace.configure(|command| command.subcommand_help_heading("Container Commands"));

        namespace.add_verb(list_command(), list);
        namespace.add_verb(inspect_command(), inspect);
        namespace.add_verb(
            with_create_args(Command::new("create").about("Create a new container")),
            create,
        );
        namespace.add_verb(
            with_create_args(Command::new("run").about("Create a new container and start it")),
            run,
        );
        namespace.add_verb(start_command(), start);
        namespace.add_verb(stop_command(state.ensure_default_stop_time()), stop);
        namespace.add_verb(rm_command(), rm);
        Ok(())
    }
}

fn list_command() -> Command {
    with_dump_flags(
        Command::new("list")
            .about("Lists containers")
            .arg(flag("all", Some('a'), "all", "Include non-running containers"))
            .arg(flag("quiet", Some('q'), "quiet", "Only print IDs")),
    )
}

fn inspect_command() -> Command {
    with_dump_flags(
        Command::new("inspect")
            .about("Inspects the detail of a container")
            .arg(
                Arg::new("container")
                    .required(true)
                    .help("The name or ID of the container"),
            ),
    )
}

fn with_create_args(command: Command) -> Command {
    command
        .arg(flag(
            "id",
            None,
            "id",
            "Display the ID of the created container instead of the name",
        ))
        .arg(
            Arg::new("option")
                .short('o')
                .long("option")
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Include an engine create option; KEY:=VALUE parses VALUE as JSON"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("The name of the container"),
        )
        .arg(
            Arg::new("publish")
                .short('p')
                .long("publish")
                .action(ArgAction::Append)
                .value_name("[IP:][HOST:]GUEST[/PROTO]")
                .help("Publish a container's port to the host"),
        )
        .arg(
            Arg::new("volume")
                .short('v')
                .long("volume")
                .action(ArgAction::Append)
                .value_name("NAME:PATH[:MODE]")
                .help("Bind mount a volume"),
        )
        .arg(
            Arg::new("env")
                .short('e')
                .long("env")
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Set an environment variable"),
        )
        .arg(
            Arg::new("image")
                .required(true)
                .help("The image to create the container from"),
        )
        .arg(
            Arg::new("cmd")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("The command to run"),
        )
}

fn start_command() -> Command {
    Command::new("start")
        .about("Start an existing container")
        .arg(containers_arg("The container to start"))
}

fn stop_command(default_timeout: u64) -> Command {
    Command::new("stop")
        .about("Stops a running container")
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_parser(value_parser!(u64))
                .default_value(default_timeout.to_string())
                .help(format!(
                    "The amount of time to wait, in seconds, before killing the container. \
                     Default: {}",
                    default_timeout
                )),
        )
        .arg(containers_arg("The container to stop"))
}

fn rm_command() -> Command {
    Command::new("rm")
        .about("Removes a stopped container")
        .arg(flag(
            "force",
            Some('f'),
            "force",
            "Force the removal of a running container (uses SIGKILL)",
        ))
        .arg(flag("link", Some('l'), "link", "Remove the specified link"))
        .arg(flag(
            "volumes",
            Some('v'),
            "volumes",
            "Remove the volumes associated with the container",
        ))
        .arg(containers_arg("The container to remove"))
}

fn containers_arg(help: &'static str) -> Arg {
    Arg::new("container")
        .required(true)
        .num_args(1..)
        .help(help)
}

/// Resolve every placeholder up front so a bad one fails before any engine call.
fn resolve_containers(state: &SessionState, matches: &ArgMatches) -> Result<Vec<String>, DkrError> {
    string_args(matches, "container")
        .iter()
        .map(|token| resolve_container(state, token))
        .collect()
}

fn list(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let containers = ctx.engine.list_containers(matches.get_flag("all"))?;

    if matches.get_flag("json") || matches.get_flag("pprint") {
        writeln!(ctx.out, "{}", render_dump(&containers, dump_format(matches))?)?;
    } else if matches.get_flag("quiet") {
        for container in &containers {
            writeln!(ctx.out, "{}", container.id)?;
        }
    } else {
        writeln!(ctx.out, "{}", format_container_table(&containers, now()))?;
    }
    Ok(())
}

fn inspect(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let id = resolve_container(ctx.state, &string_arg(matches, "container"))?;
    let detail = ctx.engine.inspect_container(&id)?;

    let full_id = detail
        .get("Id")
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();
    ctx.state.set_last_container(full_id);

    writeln!(ctx.out, "{}", render_dump(&detail, dump_format(matches))?)?;
    Ok(())
}

/// Translate create flags. Every token is validated before the engine is involved.
fn create_config(
    state: &SessionState,
    matches: &ArgMatches,
) -> Result<CreateContainerConfig, DkrError> {
    let image = resolve_image(state, &string_arg(matches, "image"))?;
    let overrides = OptionTree::parse(string_args(matches, "option"))?;
    let ports = string_args(matches, "publish")
        .iter()
        .map(|token| token.parse::<PortBinding>())
        .collect::<Result<Vec<_>, _>>()?;
    let volumes = string_args(matches, "volume")
        .iter()
        .map(|token| token.parse::<VolumeBinding>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CreateContainerConfig::new(image, overrides)
        .with_command(string_args(matches, "cmd"))
        .with_name(matches.get_one::<String>("name").cloned())
        .with_env(string_args(matches, "env"))
        .with_ports(ports)
        .with_volumes(volumes))
}

/// Create from parsed flags, report it, and return the new container's id.
fn create_container(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<String, DkrError> {
    let config = create_config(ctx.state, matches)?;
    ctx.state.set_last_image(config.image.clone());

    let created = ctx.engine.create_container(&config)?;
    ctx.state.set_last_container(created.id.clone());

    for warning in &created.warnings {
        if ctx.color {
            writeln!(ctx.err, "{} {}", "WARNING:".yellow(), warning)?;
        } else {
            writeln!(ctx.err, "WARNING: {}", warning)?;
        }
    }

    if matches.get_flag("id") {
        writeln!(ctx.out, "{}", created.id)?;
    } else {
        let detail = ctx.engine.inspect_container(&created.id)?;
        let name = detail
            .get("Name")
            .and_then(Value::as_str)
            .map(|name| name.strip_prefix('/').unwrap_or(name))
            .unwrap_or(&created.id);
        writeln!(ctx.out, "{}", name)?;
    }
    Ok(created.id)
}

fn create(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    create_container(ctx, matches).map(|_| ())
}

fn run(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let id = create_container(ctx, matches)?;
    ctx.engine.start_container(&id)?;
    Ok(())
}

fn start(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let ids = resolve_containers(ctx.state, matches)?;
    let mut report = BatchReport::new();
    for id in &ids {
        let outcome = match ctx.engine.start_container(id) {
            Ok(()) => ItemOutcome::Done(id.clone()),
            Err(e) => ItemOutcome::failed(&e),
        };
        outcome.write(ctx.out, ctx.err)?;
        report.push(outcome);
    }
    if let Some(last) = ids.last() {
        ctx.state.set_last_container(last.clone());
    }
    report.finish()
}

fn stop(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let ids = resolve_containers(ctx.state, matches)?;
    let timeout = matches
        .get_one::<u64>("timeout")
        .copied()
        .or_else(|| ctx.state.default_stop_time())
        .unwrap_or(DEFAULT_STOP_TIME_SECS);

    let mut report = BatchReport::new();
    for id in &ids {
        let outcome = match ctx.engine.stop_container(id, timeout) {
            Ok(()) => ItemOutcome::Done(id.clone()),
            Err(e) => ItemOutcome::failed(&e),
        };
        outcome.write(ctx.out, ctx.err)?;
        report.push(outcome);
    }
    if let Some(last) = ids.last() {
        ctx.state.set_last_container(last.clone());
    }
    report.finish()
}

fn rm(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let ids = resolve_containers(ctx.state, matches)?;
    let flags = RemoveContainerFlags {
        force: matches.get_flag("force"),
        volumes: matches.get_flag("volumes"),
        link: matches.get_flag("link"),
    };

    let mut report = BatchReport::new();
    for id in &ids {
        let outcome = match ctx.engine.remove_container(id, flags) {
            Ok(()) => ItemOutcome::Done(id.clone()),
            Err(e) if e.is_not_found() => {
                debug!(id = %id, "Container already absent");
                ItemOutcome::Done(id.clone())
            }
            Err(e) => ItemOutcome::failed(&e),
        };
        if matches!(outcome, ItemOutcome::Done(_)) && ctx.state.last_container() == Some(id.as_str())
        {
            ctx.state.clear_last_container();
        }
        outcome.write(ctx.out, ctx.err)?;
        report.push(outcome);
    }
    report.finish()
}
