//! # Validate Subcommand
//!
//! Runs one submission through the form pipeline with the JSON Schema
//! adapter and prints the validated form record.
//!
//! The submission is either a single JSON file holding nested data, or a
//! list of `key=value` wire entries:
//!
//! ```bash
//! formshape validate signup.schema.json submission.json
//! formshape validate signup.schema.json email=ada@example.com age=36
//! ```
//!
//! Exits `0` when the data is valid and `1` when it is not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use formshape_core::StructuralSchema;
use formshape_form::{validate_form, EngineConfig, JsonSchemaAdapter, MemoCache, ValidatedForm, WirePayload};

use crate::{load_schema, print_json};

/// Arguments for `formshape validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file.
    pub schema: PathBuf,

    /// A JSON data file, or `key=value` wire entries.
    #[arg(required = true)]
    pub input: Vec<String>,

    /// Validate the data as submitted, without merging schema defaults.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &EngineConfig) -> Result<u8> {
    let mut config = config.clone();
    config.strict |= args.strict;

    let schema = Arc::new(load_schema(&args.schema)?);
    let payload = read_input(&args.input)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let form = runtime.block_on(validate_payload(schema, payload, &config))?;

    print_json(&form)?;
    if form.valid {
        tracing::info!(id = %form.id, "submission is valid");
        Ok(0)
    } else {
        tracing::info!(id = %form.id, errors = form.flat_errors().len(), "submission is invalid");
        Ok(1)
    }
}

async fn validate_payload(
    schema: Arc<StructuralSchema>,
    payload: WirePayload,
    config: &EngineConfig,
) -> Result<ValidatedForm> {
    let cache = MemoCache::new();
    let adapter = JsonSchemaAdapter::new(schema, &cache).context("cannot build validator")?;
    validate_form(&adapter, Some(payload), config)
        .await
        .context("validation failed to run")
}

/// A lone argument without `=` names a JSON data file; anything else is a
/// list of wire entries.
fn read_input(input: &[String]) -> Result<WirePayload> {
    match input {
        [single] if !single.contains('=') => {
            let path = Path::new(single);
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read data {}", path.display()))?;
            let data: Value =
                serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;
            Ok(WirePayload::Nested(data))
        }
        entries => Ok(WirePayload::from_pairs(entries.iter().map(String::as_str))),
    }
}
