//! Container create configuration.
//!
//! Raw `-o` options form the base of the engine request; the fields derived from explicit
//! flags (image, command, name, env, ports, volumes) are laid on top, and any raw option
//! that names one of those fields is dropped so the flag always wins.

use crate::args::{OptionTree, PortBinding, VolumeBinding};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateContainerConfig {
    pub image: String,
    pub command: Option<Vec<String>>,
    pub name: Option<String>,
    pub env: Vec<String>,
    pub ports: Vec<PortBinding>,
    pub volumes: Vec<VolumeBinding>,
    overrides: OptionTree,
}

/// Keys owned by the explicit flags, in either spelling the option tree accepts.
const IMAGE_KEYS: &[&[&str]] = &[&["image"], &["Image"]];
const COMMAND_KEYS: &[&[&str]] = &[&["command"], &["cmd"], &["Cmd"]];
const NAME_KEYS: &[&[&str]] = &[&["name"], &["Name"]];
const ENV_KEYS: &[&[&str]] = &[&["environment"], &["env"], &["Env"]];
const PORT_KEYS: &[&[&str]] = &[
    &["ports"],
    &["exposed_ports"],
    &["ExposedPorts"],
    &["host_config", "port_bindings"],
    &["HostConfig", "PortBindings"],
];
const VOLUME_KEYS: &[&[&str]] = &[
    &["volumes"],
    &["Volumes"],
    &["host_config", "binds"],
    &["HostConfig", "Binds"],
];

impl CreateContainerConfig {
    pub fn new(image: impl Into<String>, overrides: OptionTree) -> Self {
        Self {
            image: image.into(),
            command: None,
            name: None,
            env: Vec::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            overrides,
        }
    }

    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = if command.is_empty() {
            None
        } else {
            Some(command)
        };
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_ports(mut self, ports: Vec<PortBinding>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_volumes(mut self, volumes: Vec<VolumeBinding>) -> Self {
        self.volumes = volumes;
        self
    }

    /// Raw options left after the explicit flags claimed their keys.
    pub fn overrides(&self) -> OptionTree {
        let mut tree = self.overrides.clone();
        let mut claimed: Vec<&[&str]> = Vec::new();
        claimed.extend_from_slice(IMAGE_KEYS);
        claimed.extend_from_slice(COMMAND_KEYS);
        claimed.extend_from_slice(NAME_KEYS);
        if !self.env.is_empty() {
            claimed.extend_from_slice(ENV_KEYS);
        }
        if !self.ports.is_empty() {
            claimed.extend_from_slice(PORT_KEYS);
        }
        if !self.volumes.is_empty() {
            claimed.extend_from_slice(VOLUME_KEYS);
        }
        for path in claimed {
            tree.remove(path);
        }
        tree
    }

    /// The engine create request body. The container name travels separately.
    pub fn to_engine_body(&self) -> Map<String, Value> {
        let mut body = match engine_keys(Value::Object(self.overrides().into_map())) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        body.insert("Image".to_string(), Value::String(self.image.clone()));
        if let Some(command) = &self.command {
            body.insert("Cmd".to_string(), json!(command));
        }
        if !self.env.is_empty() {
            body.insert("Env".to_string(), json!(self.env));
        }

        if !self.ports.is_empty() {
            let mut exposed = Map::new();
            let mut bindings = Map::new();
            for port in &self.ports {
                exposed.insert(port.exposed_key(), json!({}));
                let entry = bindings
                    .entry(port.exposed_key())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    list.push(json!({
                        "HostIp": port.ip.clone().unwrap_or_default(),
                        "HostPort": port.host_port.map(|p| p.to_string()).unwrap_or_default(),
                    }));
                }
            }
            body.insert("ExposedPorts".to_string(), Value::Object(exposed));
            host_config(&mut body).insert("PortBindings".to_string(), Value::Object(bindings));
        }

        if !self.volumes.is_empty() {
            let mounts: Map<String, Value> = self
                .volumes
                .iter()
                .map(|v| (v.guest_mount_point.clone(), json!({})))
                .collect();
            let binds: Vec<String> = self.volumes.iter().map(VolumeBinding::bind_spec).collect();
            body.insert("Volumes".to_string(), Value::Object(mounts));
            host_config(&mut body).insert("Binds".to_string(), json!(binds));
        }

        body
    }
}

fn host_config(body: &mut Map<String, Value>) -> &mut Map<String, Value> {
    let slot = body
        .entry("HostConfig".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("HostConfig was just made an object"),
    }
}

/// Map an option key to the engine's field name: known aliases first, then
/// snake_case to PascalCase. Keys that already start uppercase pass through.
fn engine_key(key: &str) -> String {
    match key {
        "command" | "cmd" => return "Cmd".to_string(),
        "environment" | "env" => return "Env".to_string(),
        "ports" => return "ExposedPorts".to_string(),
        "stdin_open" => return "OpenStdin".to_string(),
        _ => {}
    }
    if key.starts_with(|c: char| c.is_ascii_uppercase()) {
        return key.to_string();
    }
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Rename mapping keys only down the structural levels of the request; values under
/// free-form maps such as labels are left as the user wrote them.
fn engine_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut renamed_map = Map::new();
            for (key, value) in map {
                let renamed = engine_key(&key);
                let value = if FREE_FORM.contains(&renamed.as_str()) {
                    value
                } else {
                    engine_keys(value)
                };
                merge_value(&mut renamed_map, renamed, value);
            }
            Value::Object(renamed_map)
        }
        other => other,
    }
}

/// `host_config.x` and `HostConfig.y` land on the same field; mappings are merged.
fn merge_value(target: &mut Map<String, Value>, key: String, value: Value) {
    if let Value::Object(incoming) = value {
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            for (k, v) in incoming {
                merge_value(existing, k, v);
            }
            return;
        }
        target.insert(key, Value::Object(incoming));
        return;
    }
    target.insert(key, value);
}

const FREE_FORM: &[&str] = &[
    "Labels",
    "ExposedPorts",
    "Volumes",
    "PortBindings",
    "Sysctls",
    "StorageOpt",
    "Tmpfs",
    "Annotations",
];
