//! # Parse Subcommand
//!
//! Parses a definition against a schema and prints the object graph.
//! Constructed objects print as `{"$type": ..., "repr": ...}`.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use defs_core::Parsed;
use defs_schema::{load_source, Parser, ParserConfig};

use crate::{standard_registry, EXIT_OK, EXIT_REJECTED};

/// Arguments for the parse subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Schema file path or inline YAML.
    pub schema: String,

    /// Definition file path or inline YAML.
    pub definition: String,

    /// Leave mappings in the result as plain mappings.
    #[arg(long)]
    pub no_attrdicts: bool,

    /// Reject definitions nested deeper than this.
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Output format for the parsed object graph.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Execute the parse subcommand. Flags override `config`.
pub fn run_parse(args: &ParseArgs, mut config: ParserConfig) -> Result<u8> {
    if args.no_attrdicts {
        config.attrdicts = false;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = Some(max_depth);
    }

    let schema = load_source(&args.schema).context("failed to load schema")?;
    let parser = match Parser::with_config(standard_registry(), schema, config) {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("FAIL: schema: {e}");
            return Ok(EXIT_REJECTED);
        }
    };

    let definition = load_source(&args.definition).context("failed to load definition")?;
    match parser.parse(&definition) {
        Ok(parsed) => {
            println!("{}", render(&parsed, args.format)?);
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("FAIL: definition: {e}");
            Ok(EXIT_REJECTED)
        }
    }
}

/// Render a parsed value in the requested format.
pub fn render(parsed: &Parsed, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(parsed).context("failed to render JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(parsed).context("failed to render YAML")?,
    };
    Ok(rendered.trim_end().to_string())
}
