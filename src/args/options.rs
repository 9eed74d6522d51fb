//! Create-option tree built from repeated `-o key[.key...][:]=value` tokens.
//!
//! Dotted keys build nested mappings. A trailing `:` on the key means the value is a JSON
//! literal (`-o host_config.privileged:=true`); otherwise it is kept as a string.

use crate::error::DkrError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionTree {
    root: Map<String, Value>,
}

impl OptionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from raw tokens, in order; later tokens overwrite earlier ones.
    pub fn parse<I, S>(tokens: I) -> Result<Self, DkrError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = OptionTree::new();
        for token in tokens {
            tree.add_token(token.as_ref())?;
        }
        Ok(tree)
    }

    pub fn add_token(&mut self, token: &str) -> Result<(), DkrError> {
        let (name, raw) = token.split_once('=').ok_or_else(|| {
            DkrError::invalid_input(format!("Option must have the form KEY=VALUE: {}", token))
        })?;

        let (name, value) = match name.strip_suffix(':') {
            Some(name) => {
                let value = serde_json::from_str::<Value>(raw)
                    .map_err(|_| DkrError::invalid_input(format!("Invalid json value: {}", raw)))?;
                (name, value)
            }
            None => (name, Value::String(raw.to_string())),
        };

        let path: Vec<&str> = name.split('.').collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(DkrError::invalid_input(format!(
                "Invalid option key: {}",
                name
            )));
        }
        self.set(&path, value);
        Ok(())
    }

    /// Set a value at a nested path, replacing any scalar that sits where a mapping is needed.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut current = &mut self.root;
        for segment in parents {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        current.insert(last.to_string(), value);
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for segment in parents {
            current = current.get(*segment)?.as_object()?;
        }
        current.get(*last)
    }

    /// Remove a nested key, returning what was there.
    pub fn remove(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &mut self.root;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.root
    }
}
