//! # defs CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use defs_cli::check::{run_check, CheckArgs};
use defs_cli::parse::{run_parse, ParseArgs};
use defs_cli::{load_config, EXIT_ERROR};

/// Definitions CLI
///
/// Validates schemas and parses definitions against them into typed
/// object graphs.
#[derive(Parser, Debug)]
#[command(name = "defs", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a parser configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a schema.
    Check(CheckArgs),

    /// Parse a definition against a schema and print the result.
    Parse(ParseArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("defs CLI starting");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Parse(args) => {
            load_config(cli.config.as_deref()).and_then(|config| run_parse(&args, config))
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defs_cli::parse::OutputFormat;

    #[test]
    fn cli_parse_check() {
        let cli = Cli::try_parse_from(["defs", "check", "schema.yaml"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert_eq!(args.schema, "schema.yaml"),
            other => panic!("expected check, got {other:?}"),
        }
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parse_parse_defaults() {
        let cli = Cli::try_parse_from(["defs", "parse", "schema.yaml", "definition.yaml"]).unwrap();
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.schema, "schema.yaml");
                assert_eq!(args.definition, "definition.yaml");
                assert!(!args.no_attrdicts);
                assert!(args.max_depth.is_none());
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("expected parse, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_parse_flags() {
        let cli = Cli::try_parse_from([
            "defs",
            "-vv",
            "--config",
            "defs.yaml",
            "parse",
            "{}",
            "13",
            "--no-attrdicts",
            "--max-depth",
            "8",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("defs.yaml")));
        match cli.command {
            Commands::Parse(args) => {
                assert!(args.no_attrdicts);
                assert_eq!(args.max_depth, Some(8));
                assert_eq!(args.format, OutputFormat::Yaml);
            }
            other => panic!("expected parse, got {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_missing_definition() {
        assert!(Cli::try_parse_from(["defs", "parse", "schema.yaml"]).is_err());
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["defs", "check", "schema.yaml", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }
}
