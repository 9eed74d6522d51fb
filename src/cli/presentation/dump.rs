//! Structured dumps of engine records.

use crate::error::DkrError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    #[default]
    Yaml,
    Json,
    Raw,
}

impl DumpFormat {
    /// `--pprint` wins over `--json`.
    pub fn from_flags(json: bool, pprint: bool) -> Self {
        match (json, pprint) {
            (_, true) => DumpFormat::Raw,
            (true, false) => DumpFormat::Json,
            (false, false) => DumpFormat::Yaml,
        }
    }
}

pub fn render_dump<T: Serialize + Debug>(value: &T, format: DumpFormat) -> Result<String, DkrError> {
    match format {
        DumpFormat::Yaml => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| DkrError::Output(format!("Failed to render YAML: {}", e))),
        DumpFormat::Json => to_json_pretty(value),
        DumpFormat::Raw => Ok(format!("{:#?}", value)),
    }
}

/// Pretty JSON with four-space indentation and keys in sorted order.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, DkrError> {
    // Going through Value puts struct fields in key order as well.
    let value: Value = serde_json::to_value(value)
        .map_err(|e| DkrError::Output(format!("Failed to render JSON: {}", e)))?;
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|e| DkrError::Output(format!("Failed to render JSON: {}", e)))?;
    String::from_utf8(buf).map_err(|e| DkrError::Output(format!("Failed to render JSON: {}", e)))
}
