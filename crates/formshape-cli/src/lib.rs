//! # formshape-cli — Command-Line Interface for formshape
//!
//! Provides the `formshape` binary, which runs the engine's operations on
//! schema files from disk and prints JSON on stdout.
//!
//! ## Subcommands
//!
//! - `formshape defaults` / `constraints` / `shape` / `hash`: inspect the
//!   artifacts derived from a schema.
//! - `formshape split-path` and `formshape unflatten`: the path and wire
//!   format utilities.
//! - `formshape validate`: run a submission through the form pipeline.
//!
//! ```bash
//! formshape shape signup.schema.json --policy arrays
//! formshape validate signup.schema.json email=ada@example.com age=36
//! ```
//!
//! ## Exit codes
//!
//! `0` on success, `1` when a submission fails validation, `2` for
//! operational errors (unreadable files, malformed schemas).

pub mod inspect;
pub mod paths;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use formshape_core::StructuralSchema;

/// Read a schema document from a JSON or YAML file.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
/// as JSON.
pub fn load_schema(path: &Path) -> Result<StructuralSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let document: Value = if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    StructuralSchema::from_value(document).with_context(|| format!("invalid schema {}", path.display()))
}

/// Render `value` as pretty JSON.
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", render(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_schema_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("form.json");
        std::fs::write(&json_path, r#"{"type":"object","properties":{"a":{"type":"string"}}}"#).unwrap();
        let yaml_path = dir.path().join("form.yaml");
        std::fs::write(&yaml_path, "type: object\nproperties:\n  a:\n    type: string\n").unwrap();

        let from_json = load_schema(&json_path).unwrap();
        let from_yaml = load_schema(&yaml_path).unwrap();
        assert_eq!(from_json.document(), from_yaml.document());
    }

    #[test]
    fn load_schema_reports_missing_file() {
        let err = load_schema(Path::new("/nonexistent/form.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/form.json"));
    }

    #[test]
    fn load_schema_rejects_boolean_subschemas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"type":"object","properties":{"a":true}}"#).unwrap();
        let err = load_schema(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid schema"));
    }
}
