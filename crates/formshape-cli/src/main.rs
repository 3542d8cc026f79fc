//! # formshape CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! the engine configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formshape_cli::inspect::{run_constraints, run_defaults, run_hash, run_shape, SchemaArgs, ShapeArgs};
use formshape_cli::paths::{run_split_path, run_unflatten, SplitPathArgs, UnflattenArgs};
use formshape_cli::validate::{run_validate, ValidateArgs};
use formshape_form::EngineConfig;

/// Exit code for failures that prevented a command from running.
const EXIT_OPERATIONAL_ERROR: u8 = 2;

/// formshape: schema-driven form data
///
/// Derives defaults, input constraints, error shapes, and structural hashes
/// from JSON Schema documents, and validates form submissions against them.
#[derive(Parser, Debug)]
#[command(name = "formshape", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to an engine configuration file (YAML). Without it the
    /// `FORMSHAPE_*` environment variables are read.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the default values of a schema.
    Defaults(SchemaArgs),

    /// Print the per-field input constraints of a schema.
    Constraints(SchemaArgs),

    /// Print the error shape of a schema.
    Shape(ShapeArgs),

    /// Print the structural hash of a schema.
    Hash(SchemaArgs),

    /// Split a field path into tokens.
    SplitPath(SplitPathArgs),

    /// Rebuild nested data from key=value entries.
    Unflatten(UnflattenArgs),

    /// Validate a submission against a schema.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "formshape CLI starting");

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Defaults(args) => run_defaults(args),
        Commands::Constraints(args) => run_constraints(args),
        Commands::Shape(args) => run_shape(args),
        Commands::Hash(args) => run_hash(args),
        Commands::SplitPath(args) => run_split_path(args),
        Commands::Unflatten(args) => run_unflatten(args),
        Commands::Validate(args) => run_validate(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path).context("failed to load configuration")?,
        None => EngineConfig::from_env().context("invalid FORMSHAPE_* environment")?,
    };
    tracing::debug!(?config, "engine configuration loaded");
    Ok(config)
}
