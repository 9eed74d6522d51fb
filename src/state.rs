//! Session State
//!
//! A small persisted JSON document carrying the "last used" container and image, plus
//! user-editable defaults. Unknown keys are kept so that newer or hand-edited documents
//! survive a load/save cycle untouched.

use crate::error::DkrError;
use serde_json::{Map, Value};
use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const LAST_CONTAINER: &str = "last_container";
pub const LAST_IMAGE: &str = "last_image";
pub const DEFAULT_STOP_TIME: &str = "default_stop_time";

/// Seconds `stop` waits before killing, until the user edits the persisted value.
pub const DEFAULT_STOP_TIME_SECS: u64 = 3600;

/// Token that refers back to the last container or image.
pub const PLACEHOLDER: &str = "-";

/// In-memory session document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    doc: Map<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(doc: Map<String, Value>) -> Self {
        Self { doc }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.doc
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.doc.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.doc.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.doc.remove(key)
    }

    /// Overlay keys from another document; `null` values delete the key.
    pub fn extend(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            if value.is_null() {
                self.doc.remove(&key);
            } else {
                self.doc.insert(key, value);
            }
        }
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.doc.get(key).and_then(Value::as_str)
    }

    pub fn last_container(&self) -> Option<&str> {
        self.get_str(LAST_CONTAINER)
    }

    pub fn set_last_container(&mut self, id: impl Into<String>) {
        self.doc
            .insert(LAST_CONTAINER.to_string(), Value::String(id.into()));
    }

    pub fn clear_last_container(&mut self) {
        self.doc.remove(LAST_CONTAINER);
    }

    pub fn last_image(&self) -> Option<&str> {
        self.get_str(LAST_IMAGE)
    }

    pub fn set_last_image(&mut self, reference: impl Into<String>) {
        self.doc
            .insert(LAST_IMAGE.to_string(), Value::String(reference.into()));
    }

    /// Persisted stop timeout, accepting integers or numeric strings from hand edits.
    pub fn default_stop_time(&self) -> Option<u64> {
        match self.doc.get(DEFAULT_STOP_TIME)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the stop timeout, writing the built-in default the first time.
    pub fn ensure_default_stop_time(&mut self) -> u64 {
        if let Some(secs) = self.default_stop_time() {
            return secs;
        }
        self.doc.insert(
            DEFAULT_STOP_TIME.to_string(),
            Value::from(DEFAULT_STOP_TIME_SECS),
        );
        DEFAULT_STOP_TIME_SECS
    }
}

/// Substitute the placeholder with `last_container`.
pub fn resolve_container(state: &SessionState, token: &str) -> Result<String, DkrError> {
    if token != PLACEHOLDER {
        return Ok(token.to_string());
    }
    state
        .last_container()
        .map(str::to_string)
        .ok_or_else(|| DkrError::invalid_input("No container to reference for \"-\""))
}

/// Substitute the placeholder with `last_image`.
pub fn resolve_image(state: &SessionState, token: &str) -> Result<String, DkrError> {
    if token != PLACEHOLDER {
        return Ok(token.to_string());
    }
    state
        .last_image()
        .map(str::to_string)
        .ok_or_else(|| DkrError::invalid_input("No image to reference for \"-\""))
}

/// File-backed persistence for [`SessionState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file is an empty state.
    pub fn load(&self) -> Result<SessionState, DkrError> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "No session state file, starting empty");
            return Ok(SessionState::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            DkrError::State(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if content.trim().is_empty() {
            return Ok(SessionState::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(doc)) => Ok(SessionState::from_map(doc)),
            Ok(_) => Err(DkrError::State(format!(
                "State file {} must contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(DkrError::State(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Save atomically (temp file + rename), creating the parent directory if needed.
    pub fn save(&self, state: &SessionState) -> Result<(), DkrError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DkrError::State(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let serialized = serde_json::to_string_pretty(state.as_map())
            .map_err(|e| DkrError::State(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized).map_err(|e| {
            DkrError::State(format!(
                "Failed to write state to {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            DkrError::State(format!(
                "Failed to move state into place at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!(path = %self.path.display(), "Session state saved");
        Ok(())
    }

    /// Load and hand back a guard that saves when it goes out of scope.
    pub fn open(self) -> Result<StateGuard, DkrError> {
        let state = self.load()?;
        Ok(StateGuard {
            store: self,
            state,
            persisted: false,
        })
    }
}

/// Scoped ownership of the session state. Dropping the guard writes the document back,
/// whether the command finished normally, returned an error, or unwound.
#[derive(Debug)]
pub struct StateGuard {
    store: StateStore,
    state: SessionState,
    persisted: bool,
}

impl StateGuard {
    /// Save now and report failures to the caller; the drop-time save is then skipped.
    pub fn persist(mut self) -> Result<(), DkrError> {
        self.persisted = true;
        self.store.save(&self.state)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

impl Deref for StateGuard {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.state
    }
}

impl DerefMut for StateGuard {
    fn deref_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = self.store.save(&self.state) {
            warn!("Failed to save session state: {}", e);
        }
    }
}
