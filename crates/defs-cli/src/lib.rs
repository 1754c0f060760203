//! # defs-cli — Command-Line Interface for Definitions
//!
//! Provides the `defs` binary.
//!
//! ## Subcommands
//!
//! - `defs check`: Validate a schema against the standard type registry.
//! - `defs parse`: Parse a definition against a schema and print the
//!   resulting object graph as JSON or YAML.
//!
//! Schema and definition arguments are file paths or inline YAML:
//!
//! ```bash
//! defs check schema.yaml
//! defs parse '{type: list, elements: {type: int}}' '[1, 2, 3]'
//! defs -vv --config defs.yaml parse schema.yaml definition.yaml --format yaml
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: the schema or definition was accepted.
//! - `1`: the schema or definition was rejected.
//! - `2`: operational failure (unreadable file, bad configuration).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `defs-schema`; no parsing logic lives here.

pub mod check;
pub mod parse;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use defs_core::TypeRegistry;
use defs_schema::ParserConfig;

/// The input was accepted.
pub const EXIT_OK: u8 = 0;
/// The schema or definition was rejected.
pub const EXIT_REJECTED: u8 = 1;
/// The command could not run.
pub const EXIT_ERROR: u8 = 2;

/// Load parser configuration from `path`, or from the environment when no
/// file is given.
pub fn load_config(path: Option<&Path>) -> Result<ParserConfig> {
    match path {
        Some(path) => ParserConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => ParserConfig::from_env().context("invalid configuration in environment"),
    }
}

/// The registry the CLI resolves type names in: built-ins plus the
/// standard modules.
pub fn standard_registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::with_standard_modules())
}
