//! # Check Subcommand
//!
//! Validates a schema without parsing any definition.

use anyhow::{Context, Result};
use clap::Args;

use defs_schema::{load_source, SchemaNode};

use crate::{standard_registry, EXIT_OK, EXIT_REJECTED};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema file path or inline YAML.
    pub schema: String,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let schema = load_source(&args.schema).context("failed to load schema")?;
    let registry = standard_registry();
    match SchemaNode::compile(schema, &registry) {
        Ok(Some(node)) => {
            let type_name = node.type_name().unwrap_or("any");
            println!("OK: schema is valid ({type_name}, {})", node.shape().name());
            Ok(EXIT_OK)
        }
        Ok(None) => {
            println!("OK: schema accepts any definition");
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            Ok(EXIT_REJECTED)
        }
    }
}
