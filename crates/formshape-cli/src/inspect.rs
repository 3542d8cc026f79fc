//! # Schema Inspection Subcommands
//!
//! `defaults`, `constraints`, `shape`, and `hash` each load a schema and
//! print one derived artifact as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use formshape_core::{schema_hash, StructuralSchema};
use formshape_schema::{build_shape, constraints, default_values, ShapePolicy};

use crate::{load_schema, print_json};

/// Arguments for subcommands that take only a schema file.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file (JSON, or YAML with a `.yaml`/`.yml` extension).
    pub schema: PathBuf,
}

/// Arguments for `formshape shape`.
#[derive(Args, Debug)]
pub struct ShapeArgs {
    /// Schema file.
    pub schema: PathBuf,

    /// Which containers to mark: `errors` (arrays and objects),
    /// `arrays`, or `objects`.
    #[arg(long, default_value = "errors", value_parser = ["errors", "arrays", "objects"])]
    pub policy: String,
}

/// Print the default values of a schema.
pub fn run_defaults(args: &SchemaArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    print_json(&default_values(&schema))?;
    Ok(0)
}

/// Print the per-field input constraints of a schema.
pub fn run_constraints(args: &SchemaArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    print_json(&constraints(&schema))?;
    Ok(0)
}

/// Print the error shape of a schema under the chosen policy.
pub fn run_shape(args: &ShapeArgs) -> Result<u8> {
    let policy = ShapePolicy::from_name(&args.policy)
        .with_context(|| format!("unknown shape policy {:?}", args.policy))?;
    let schema = load_schema(&args.schema)?;
    print_json(&shape_output(&schema, policy)?)?;
    Ok(0)
}

/// Print the structural hash of a schema.
pub fn run_hash(args: &SchemaArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    print_json(&hash_output(&schema))?;
    Ok(0)
}

fn shape_output(schema: &StructuralSchema, policy: ShapePolicy) -> Result<Value> {
    let shape = build_shape(schema, policy).context("cannot build an error shape")?;
    serde_json::to_value(shape).context("failed to serialize error shape")
}

fn hash_output(schema: &StructuralSchema) -> Value {
    json!({ "hash": schema_hash(schema).as_str() })
}
