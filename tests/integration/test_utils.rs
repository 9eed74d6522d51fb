//! Shared test utilities for integration tests
//!
//! Provides an isolated dkr home per test and a scripted engine so commands can run
//! end to end without a container daemon.

use dkr::cli::RunContext;
use dkr::config::DkrConfig;
use dkr::engine::{
    ContainerSummary, CreateContainerConfig, CreatedContainer, EngineClient, ImageSummary,
    PullProgress, PullStream, RemoveContainerFlags, RemoveImageFlags,
};
use dkr::error::EngineError;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize DKR_* environment variable access across all tests
static DKR_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Point `DKR_HOME` at `home` and set `vars` for the duration of `f`, restoring the
/// previous values afterwards.
pub fn with_dkr_env<F, R>(home: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = DKR_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut names = vec!["DKR_HOME"];
    names.extend(vars.iter().map(|(name, _)| *name));
    let saved: Vec<(&str, Option<String>)> = names
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    std::env::set_var("DKR_HOME", home.path());
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }

    result
}

/// Isolated state file and user command directory for one test.
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("commands")).unwrap();
        Self { dir }
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.dir.path().join("commands")
    }

    pub fn config(&self) -> DkrConfig {
        let mut config = DkrConfig::default();
        config.state.file = Some(self.state_file());
        config.commands.user_dir = Some(self.commands_dir());
        config
    }

    /// Saved session state, or an empty object when nothing was written.
    pub fn state(&self) -> Value {
        match std::fs::read_to_string(self.state_file()) {
            Ok(content) => serde_json::from_str(&content).unwrap(),
            Err(_) => json!({}),
        }
    }

    pub fn write_state(&self, state: Value) {
        std::fs::write(self.state_file(), state.to_string()).unwrap();
    }

    /// Install a user command whose behaviour is a `/bin/sh` script.
    pub fn install_script(&self, manifest_name: &str, names: &[&str], script: &str) -> PathBuf {
        let script_path = self.dir.path().join(format!("{}.sh", manifest_name));
        std::fs::write(&script_path, script).unwrap();
        let names = names
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let manifest = format!(
            "command = [{}]\nhelp = \"Scripted test command\"\nexecutable = \"/bin/sh\"\nargs = [\"{}\"]\n",
            names,
            script_path.display()
        );
        std::fs::write(
            self.commands_dir().join(format!("{}.toml", manifest_name)),
            manifest,
        )
        .unwrap();
        script_path
    }

    /// Run one invocation against `engine`, capturing both streams.
    pub fn run(&self, engine: &StubEngine, args: &[&str]) -> RunOutput {
        let context = RunContext::with_engine(self.config(), Box::new(engine.clone()));
        let mut argv = vec!["dkr"];
        argv.extend_from_slice(args);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = context.execute(argv, &mut out, &mut err);
        RunOutput {
            code,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub code: i32,
    pub out: String,
    pub err: String,
}

#[derive(Debug, Default)]
struct StubInner {
    calls: Vec<String>,
    containers: Vec<ContainerSummary>,
    images: Vec<ImageSummary>,
    failures: HashMap<String, EngineError>,
    pull_records: Vec<PullProgress>,
}

/// Scripted engine. Clones share the same call log.
#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    inner: Rc<RefCell<StubInner>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, id: &str, name: &str) -> Self {
        let summary: ContainerSummary = serde_json::from_value(json!({
            "Id": id,
            "Names": [format!("/{}", name)],
            "Image": "alpine:latest",
            "Command": "sh",
            "Created": 0,
            "Status": "Up 1 second",
            "Ports": [],
        }))
        .unwrap();
        self.inner.borrow_mut().containers.push(summary);
        self
    }

    pub fn with_image(self, id: &str, tags: &[&str]) -> Self {
        let summary: ImageSummary = serde_json::from_value(json!({
            "Id": id,
            "RepoTags": tags,
            "Created": 0,
            "Size": 1024,
        }))
        .unwrap();
        self.inner.borrow_mut().images.push(summary);
        self
    }

    pub fn with_pull_records(self, records: Vec<PullProgress>) -> Self {
        self.inner.borrow_mut().pull_records = records;
        self
    }

    /// Fail any call whose target is `id`.
    pub fn failing(self, id: &str, error: EngineError) -> Self {
        self.inner
            .borrow_mut()
            .failures
            .insert(id.to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    fn record(&self, call: String, target: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(call);
        match inner.failures.get(target) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl EngineClient for StubEngine {
    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError> {
        self.record(format!("list_containers all={}", all), "")?;
        Ok(self.inner.borrow().containers.clone())
    }

    fn inspect_container(&self, id: &str) -> Result<Value, EngineError> {
        self.record(format!("inspect_container {}", id), id)?;
        Ok(json!({"Id": id, "Name": format!("/{}-name", id)}))
    }

    fn create_container(
        &self,
        config: &CreateContainerConfig,
    ) -> Result<CreatedContainer, EngineError> {
        self.record(format!("create_container {}", config.image), &config.image)?;
        Ok(CreatedContainer {
            id: "stub0001".to_string(),
            warnings: Vec::new(),
        })
    }

    fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.record(format!("start_container {}", id), id)
    }

    fn stop_container(&self, id: &str, timeout_secs: u64) -> Result<(), EngineError> {
        self.record(format!("stop_container {} t={}", id, timeout_secs), id)
    }

    fn remove_container(&self, id: &str, _flags: RemoveContainerFlags) -> Result<(), EngineError> {
        self.record(format!("remove_container {}", id), id)
    }

    fn list_images(&self, all: bool) -> Result<Vec<ImageSummary>, EngineError> {
        self.record(format!("list_images all={}", all), "")?;
        Ok(self.inner.borrow().images.clone())
    }

    fn inspect_image(&self, id: &str) -> Result<Value, EngineError> {
        self.record(format!("inspect_image {}", id), id)?;
        Ok(json!({"Id": format!("sha256:{}", id), "RepoTags": [id]}))
    }

    fn pull_image<'a>(&'a self, reference: &str) -> Result<PullStream<'a>, EngineError> {
        self.record(format!("pull_image {}", reference), reference)?;
        let records = self.inner.borrow().pull_records.clone();
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn remove_image(&self, reference: &str, _flags: RemoveImageFlags) -> Result<(), EngineError> {
        self.record(format!("remove_image {}", reference), reference)
    }
}
