//! # Source Loading
//!
//! Turns schema and definition sources into generic values. A source is
//! either a path to an existing file or inline YAML text; YAML is a
//! superset of JSON, so JSON sources load the same way. An empty source
//! loads as null, which the parser treats as "absent".

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use defs_core::DefsError;

/// Error loading a source.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file exists but could not be read.
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid YAML.
    #[error("invalid YAML in {origin}: {reason}")]
    Yaml { origin: String, reason: String },

    /// The YAML uses features that have no generic value equivalent.
    #[error("cannot convert {origin}: {reason}")]
    Convert { origin: String, reason: String },
}

impl From<LoadError> for DefsError {
    fn from(e: LoadError) -> Self {
        DefsError::Load(e.to_string())
    }
}

/// Load a source that is either a file path or inline YAML.
///
/// Text naming an existing file is read from disk; anything else is
/// parsed as inline YAML.
pub fn load_source(text: &str) -> Result<Value, LoadError> {
    let candidate = text.trim();
    if !candidate.is_empty() && !candidate.contains('\n') && Path::new(candidate).is_file() {
        return load_file(Path::new(candidate));
    }
    load_str(text, "inline source")
}

/// Load a YAML or JSON file.
pub fn load_file(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded source file");
    load_str(&content, &path.display().to_string())
}

/// Parse YAML text. `origin` names the source in error messages.
pub fn load_str(text: &str, origin: &str) -> Result<Value, LoadError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| LoadError::Yaml {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;
    yaml_to_json_value(&yaml).map_err(|reason| LoadError::Convert {
        origin: origin.to_string(),
        reason,
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and scalar mapping keys are stringified. A null key
/// becomes `"null"`, the same name [`defs_core::Parsed::kind`] reports for a
/// null value, so `{~: 1}` and `{null: 1}` load identically. Mapping keys
/// that are themselves collections are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f}"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
