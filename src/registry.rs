//! Command registry: built-in command modules plus user-supplied ones, assembled into a
//! two-level command tree (resource noun, then verb).
//!
//! Modules never see process arguments directly. Each registered name gets a fresh
//! [`Namespace`] in which the module declares its verbs and binds a handler to each; the
//! resulting [`CommandTree`] parses the arguments and routes them to the bound handler.

use crate::engine::EngineClient;
use crate::error::DkrError;
use crate::state::SessionState;
use clap::{ArgMatches, Command};
use std::collections::{BTreeMap, HashMap};
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

pub mod external;

pub use external::{CommandManifest, ExternalCommand};

/// Help shown for a module that does not describe itself.
pub const DEFAULT_HELP: &str = "Does something wonderful!";

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub engine: &'a dyn EngineClient,
    pub state: &'a mut SessionState,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    /// Program name used in usage hints.
    pub program: &'a str,
    /// Whether `err` is a terminal that takes color.
    pub color: bool,
}

pub type Handler = Rc<dyn Fn(&mut CommandContext<'_>, &ArgMatches) -> Result<(), DkrError>>;

/// A source of commands. Registered once per name it answers to.
pub trait CommandModule {
    fn names(&self) -> Vec<String>;

    fn help_summary(&self, _invoked_as: &str) -> String {
        DEFAULT_HELP.to_string()
    }

    /// Declare verbs under `namespace`. Registration may read and seed session state,
    /// e.g. a default that shows up in help text.
    fn register(
        &self,
        engine: &dyn EngineClient,
        namespace: &mut Namespace,
        state: &mut SessionState,
    ) -> Result<(), DkrError>;
}

/// The subcommand namespace handed to a module for one registered name.
pub struct Namespace {
    name: String,
    command: Command,
    default: Option<Handler>,
    verbs: HashMap<String, Handler>,
}

impl Namespace {
    pub fn new(name: &str, about: String) -> Self {
        Self {
            name: name.to_string(),
            command: Command::new(name.to_string())
                .about(about)
                .subcommand_value_name("COMMAND"),
            default: None,
            verbs: HashMap::new(),
        }
    }

    /// The name this namespace was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adjust the noun's own clap command (arguments, help headings).
    pub fn configure(&mut self, f: impl FnOnce(Command) -> Command) {
        let command = std::mem::take(&mut self.command);
        self.command = f(command);
    }

    /// Handler run when no verb is given.
    pub fn set_default<F>(&mut self, handler: F)
    where
        F: Fn(&mut CommandContext<'_>, &ArgMatches) -> Result<(), DkrError> + 'static,
    {
        self.default = Some(Rc::new(handler));
    }

    pub fn add_verb<F>(&mut self, verb: Command, handler: F)
    where
        F: Fn(&mut CommandContext<'_>, &ArgMatches) -> Result<(), DkrError> + 'static,
    {
        let name = verb.get_name().to_string();
        self.configure(|command| command.subcommand(verb));
        self.verbs.insert(name, Rc::new(handler));
    }

    fn into_parts(self) -> (Command, Route) {
        (
            self.command,
            Route {
                default: self.default,
                verbs: self.verbs,
            },
        )
    }
}

struct Route {
    default: Option<Handler>,
    verbs: HashMap<String, Handler>,
}

/// Load every command manifest in `dir`, keyed by each name it answers to.
///
/// Scans non-recursively for `*.toml` files. A missing directory yields an empty map;
/// manifests that cannot be read or parsed are skipped with a warning.
pub fn load_modules(dir: &Path) -> BTreeMap<String, Rc<dyn CommandModule>> {
    let mut modules: BTreeMap<String, Rc<dyn CommandModule>> = BTreeMap::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "No user command directory");
        return modules;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read command directory {}: {}", dir.display(), e);
            return modules;
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("toml")))
        .collect();
    paths.sort();

    for path in paths {
        let command = match ExternalCommand::from_manifest(&path) {
            Ok(command) => Rc::new(command),
            Err(e) => {
                warn!("Skipping command manifest {}: {}", path.display(), e);
                continue;
            }
        };
        for name in command.names() {
            debug!(name = %name, manifest = %path.display(), "Loaded user command");
            modules.insert(name, command.clone() as Rc<dyn CommandModule>);
        }
    }
    modules
}

/// Name to module mapping. Later inserts replace earlier ones of the same name.
pub struct CommandRegistry {
    modules: BTreeMap<String, Rc<dyn CommandModule>>,
}

impl CommandRegistry {
    /// Registry holding only the built-in modules.
    pub fn new() -> Self {
        let mut registry = Self {
            modules: BTreeMap::new(),
        };
        for module in crate::commands::builtin_modules() {
            registry.register(module);
        }
        registry
    }

    /// Built-ins overlaid with the user modules found in `user_dir`.
    pub fn load(user_dir: &Path) -> Self {
        let mut registry = Self::new();
        registry.overlay(load_modules(user_dir));
        registry
    }

    pub fn register(&mut self, module: Rc<dyn CommandModule>) {
        for name in module.names() {
            self.modules.insert(name, module.clone());
        }
    }

    pub fn overlay(&mut self, modules: BTreeMap<String, Rc<dyn CommandModule>>) {
        for (name, module) in modules {
            if self.modules.insert(name.clone(), module).is_some() {
                debug!(name = %name, "User command replaces built-in");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn CommandModule>> {
        self.modules.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Let every module declare its verbs under each of its names, on top of `root`.
    pub fn build_tree(
        &self,
        root: Command,
        engine: &dyn EngineClient,
        state: &mut SessionState,
    ) -> Result<CommandTree, DkrError> {
        let mut root = root.subcommand_value_name("COMMAND");
        let mut routes = HashMap::new();
        for (name, module) in &self.modules {
            let mut namespace = Namespace::new(name, module.help_summary(name));
            module.register(engine, &mut namespace, state)?;
            let (command, route) = namespace.into_parts();
            root = root.subcommand(command);
            routes.insert(name.clone(), route);
        }
        Ok(CommandTree { root, routes })
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed-command routing table produced by [`CommandRegistry::build_tree`].
pub struct CommandTree {
    root: Command,
    routes: HashMap<String, Route>,
}

impl CommandTree {
    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn parse<I, T>(&mut self, args: I) -> Result<ArgMatches, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.root.try_get_matches_from_mut(args)
    }

    /// Run the handler bound to the parsed noun and verb. Missing pieces fall back to the
    /// noun's default handler, or to a usage hint when no noun was given.
    pub fn dispatch(
        &self,
        matches: &ArgMatches,
        ctx: &mut CommandContext<'_>,
    ) -> Result<(), DkrError> {
        let Some((noun, noun_matches)) = matches.subcommand() else {
            writeln!(
                ctx.err,
                "No valid command specified. `{} -h` for help.",
                ctx.program
            )?;
            return Ok(());
        };
        let route = self
            .routes
            .get(noun)
            .ok_or_else(|| DkrError::Usage(format!("Unknown command: {}", noun)))?;

        let verb = noun_matches
            .subcommand()
            .and_then(|(verb, verb_matches)| {
                route.verbs.get(verb).map(|handler| (verb, handler, verb_matches))
            });
        match verb {
            Some((verb, handler, verb_matches)) => {
                debug!(noun, verb, "Dispatching command");
                handler(ctx, verb_matches)
            }
            None => match &route.default {
                Some(handler) => handler(ctx, noun_matches),
                None => {
                    writeln!(
                        ctx.err,
                        "No valid command specified. `{} {} -h` for help.",
                        ctx.program, noun
                    )?;
                    Ok(())
                }
            },
        }
    }
}
