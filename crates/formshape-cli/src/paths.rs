//! # Path and Wire-Format Subcommands
//!
//! `split-path` prints the tokens of a field path; `unflatten` rebuilds
//! nested data from `key=value` entries the way a form submission is
//! decoded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use formshape_core::{join_path, split_path, StructuralSchema};
use formshape_form::{read_payload, WirePayload};

use crate::{load_schema, print_json};

/// Arguments for `formshape split-path`.
#[derive(Args, Debug)]
pub struct SplitPathArgs {
    /// Field path, e.g. `items[0].name`.
    pub path: String,
}

/// Arguments for `formshape unflatten`.
#[derive(Args, Debug)]
pub struct UnflattenArgs {
    /// Wire entries as `key=value`. Repeated keys collect into a list.
    #[arg(required = true)]
    pub entries: Vec<String>,

    /// Coerce values to the leaf types of this schema.
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

/// Print the tokens of a path, plus its canonical rendering.
pub fn run_split_path(args: &SplitPathArgs) -> Result<u8> {
    let tokens = split_path(&args.path);
    print_json(&serde_json::json!({
        "tokens": tokens,
        "path": join_path(&tokens),
    }))?;
    Ok(0)
}

/// Print the nested data encoded by the entries.
pub fn run_unflatten(args: &UnflattenArgs) -> Result<u8> {
    let schema = args.schema.as_deref().map(load_schema).transpose()?;
    print_json(&decode_entries(&args.entries, schema.as_ref())?)?;
    Ok(0)
}

fn decode_entries(raw: &[String], schema: Option<&StructuralSchema>) -> Result<Value> {
    let payload = WirePayload::from_pairs(raw.iter().map(String::as_str));
    let (id, data) = read_payload(payload, schema).context("cannot decode entries")?;
    if let Some(id) = id {
        tracing::info!(id = %id, "ignoring form id entry");
    }
    Ok(data)
}
