//! `image` (alias `i`): list, inspect, pull, rm.

use super::batch::{BatchReport, ItemOutcome};
use super::{dump_format, flag, now, set_usage_default, string_arg, string_args, with_dump_flags};
use crate::cli::presentation::{format_image_table, render_dump, PullRenderer};
use crate::engine::{EngineClient, RemoveImageFlags};
use crate::error::DkrError;
use crate::registry::{CommandContext, CommandModule, Namespace};
use crate::state::{resolve_image, SessionState};
use clap::{Arg, ArgMatches, Command};
use serde_json::Value;
use std::io::Write;

pub struct ImageCommands;

impl CommandModule for ImageCommands {
    fn names(&self) -> Vec<String> {
        vec!["image".to_string(), "i".to_string()]
    }

    fn help_summary(&self, invoked_as: &str) -> String {
        if invoked_as == "i" {
            "Alias for \"image\"".to_string()
        } else {
            "Various commands for images".to_string()
        }
    }

    fn register(
        &self,
        _engine: &dyn EngineClient,
        namespace: &mut Namespace,
        _state: &mut SessionState,
    ) -> Result<(), DkrError> {
        set_usage_default(namespace);
        namespace.configure(|command| command.subcommand_help_heading("Image Commands"));

        namespace.add_verb(
            with_dump_flags(
                Command::new("list")
                    .about("Lists images")
                    .arg(flag("all", Some('a'), "all", "Include all layers"))
                    .arg(flag("quiet", Some('q'), "quiet", "Only print IDs")),
            ),
            list,
        );
        namespace.add_verb(
            with_dump_flags(
                Command::new("inspect")
                    .about("Inspects the detail of an image")
                    .arg(
                        Arg::new("image")
                            .required(true)
                            .help("The name or ID of the image"),
                    ),
            ),
            inspect,
        );
        namespace.add_verb(
            Command::new("pull")
                .about("Pulls an image")
                .arg(
                    Arg::new("image")
                        .required(true)
                        .help("The name of the image to pull"),
                )
                .arg(flag(
                    "all_tags",
                    Some('a'),
                    "all-tags",
                    "Download all tagged images in the repository",
                )),
            pull,
        );
        namespace.add_verb(
            Command::new("rm")
                .about("Removes an image")
                .arg(
                    Arg::new("image")
                        .required(true)
                        .num_args(1..)
                        .help("The name of the image to remove"),
                )
                .arg(flag("force", Some('f'), "force", "Force removal of the image"))
                .arg(flag(
                    "no_prune",
                    None,
                    "no-prune",
                    "Do not delete untagged parents",
                )),
            rm,
        );
        Ok(())
    }
}

/// Append `:latest` unless the last path segment already names a tag or digest.
pub fn with_default_tag(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    if name.contains(':') || name.contains('@') {
        reference.to_string()
    } else {
        format!("{}:latest", reference)
    }
}

fn list(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let images = ctx.engine.list_images(matches.get_flag("all"))?;

    if matches.get_flag("json") || matches.get_flag("pprint") {
        writeln!(ctx.out, "{}", render_dump(&images, dump_format(matches))?)?;
    } else if matches.get_flag("quiet") {
        for image in &images {
            writeln!(ctx.out, "{}", image.bare_id())?;
        }
    } else {
        writeln!(ctx.out, "{}", format_image_table(&images, now()))?;
    }
    Ok(())
}

fn inspect(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let reference = resolve_image(ctx.state, &string_arg(matches, "image"))?;
    let detail = ctx.engine.inspect_image(&reference)?;

    let tag = detail
        .get("RepoTags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .unwrap_or(&reference)
        .to_string();
    ctx.state.set_last_image(tag);

    writeln!(ctx.out, "{}", render_dump(&detail, dump_format(matches))?)?;
    Ok(())
}

fn pull(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let requested = resolve_image(ctx.state, &string_arg(matches, "image"))?;
    let reference = if matches.get_flag("all_tags") {
        requested
    } else {
        with_default_tag(&requested)
    };
    ctx.state.set_last_image(reference.clone());

    writeln!(ctx.out, "Pulling {}", reference)?;
    let engine = ctx.engine;
    let mut renderer = PullRenderer::new();
    for record in engine.pull_image(&reference)? {
        renderer.render(ctx.out, ctx.err, &record?)?;
    }

    if renderer.errors().is_empty() {
        Ok(())
    } else {
        Err(DkrError::invalid_input(format!("Failed to pull {}", reference)))
    }
}

fn rm(ctx: &mut CommandContext<'_>, matches: &ArgMatches) -> Result<(), DkrError> {
    let references = string_args(matches, "image")
        .iter()
        .map(|token| resolve_image(ctx.state, token).map(|r| with_default_tag(&r)))
        .collect::<Result<Vec<_>, _>>()?;
    let flags = RemoveImageFlags {
        force: matches.get_flag("force"),
        no_prune: matches.get_flag("no_prune"),
    };

    let mut report = BatchReport::new();
    for reference in &references {
        match ctx.engine.remove_image(reference, flags) {
            Ok(()) => {
                writeln!(ctx.out, "Removed image {}", reference)?;
                report.push(ItemOutcome::Done(reference.clone()));
            }
            Err(e) if e.is_not_found() => {
                writeln!(ctx.err, "{}", e)?;
                report.push(ItemOutcome::Done(reference.clone()));
            }
            Err(e) => {
                let outcome = ItemOutcome::failed(&e);
                outcome.write(ctx.out, ctx.err)?;
                report.push(outcome);
            }
        }
    }
    report.finish()
}
