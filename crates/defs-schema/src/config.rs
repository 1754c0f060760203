//! Parser configuration.
//!
//! Defaults suit trusted input. Override via environment variables, a
//! YAML file, or explicit construction.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use defs_core::DefsError;

/// Environment variable overriding [`ParserConfig::attrdicts`].
pub const ENV_ATTRDICTS: &str = "DEFS_ATTRDICTS";
/// Environment variable overriding [`ParserConfig::max_depth`].
pub const ENV_MAX_DEPTH: &str = "DEFS_MAX_DEPTH";

/// Options applied to every parse call of a parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Wrap every keyed mapping of a result in the strict attribute view
    /// unless the call says otherwise. Default: `true`.
    pub attrdicts: bool,
    /// Maximum nesting depth of a definition below the root. Default:
    /// unlimited. Set this when parsing untrusted definitions.
    pub max_depth: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            attrdicts: true,
            max_depth: None,
        }
    }
}

/// Error loading parser configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML for `ParserConfig`.
    #[error("invalid config in {origin}: {reason}")]
    Parse { origin: String, reason: String },

    /// An environment variable holds an unusable value.
    #[error("invalid value '{value}' for {name}")]
    InvalidVar { name: &'static str, value: String },
}

impl From<ConfigError> for DefsError {
    fn from(e: ConfigError) -> Self {
        DefsError::Config(e.to_string())
    }
}

impl ParserConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DEFS_ATTRDICTS`: `true`/`false`/`1`/`0` (default: `true`)
    /// - `DEFS_MAX_DEPTH`: positive integer (default: unlimited)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_ATTRDICTS) {
            config.attrdicts = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: ENV_ATTRDICTS,
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            let depth = value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidVar {
                name: ENV_MAX_DEPTH,
                value: value.clone(),
            })?;
            config.max_depth = Some(depth);
        }
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: "inline config".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                origin: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn with_attrdicts(mut self, attrdicts: bool) -> Self {
        self.attrdicts = attrdicts;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(config.attrdicts);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_from_vars() {
        let config =
            ParserConfig::from_vars(vars(&[(ENV_ATTRDICTS, "false"), (ENV_MAX_DEPTH, "64")])).unwrap();
        assert!(!config.attrdicts);
        assert_eq!(config.max_depth, Some(64));
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = ParserConfig::from_vars(vars(&[(ENV_MAX_DEPTH, "deep")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: ENV_MAX_DEPTH, .. }));
        assert!(ParserConfig::from_vars(vars(&[(ENV_ATTRDICTS, "maybe")])).is_err());
    }

    #[test]
    fn test_from_yaml_str() {
        let config = ParserConfig::from_yaml_str("max_depth: 8").unwrap();
        assert!(config.attrdicts);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(ParserConfig::from_yaml_str("").unwrap(), ParserConfig::default());
    }

    #[test]
    fn test_from_yaml_rejects_unknown_fields() {
        assert!(matches!(
            ParserConfig::from_yaml_str("depth: 8"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.yaml");
        std::fs::write(&path, "attrdicts: false\n").unwrap();
        let config = ParserConfig::from_yaml_file(&path).unwrap();
        assert!(!config.attrdicts);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            ParserConfig::from_yaml_file(&missing),
            Err(ConfigError::Read { .. })
        ));
    }
}
