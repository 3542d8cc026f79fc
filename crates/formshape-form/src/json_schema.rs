//! # JSON Schema Adapter
//!
//! Validates data against the structural schema document itself with the
//! `jsonschema` crate.
//!
//! ## Document preparation
//!
//! OpenAPI-style `nullable: true` is not a JSON Schema keyword. Before
//! compiling, every `nullable: true` node has `null` added to its `type`
//! (and to its `enum`, when it has one). Documents without `$schema` are
//! compiled as Draft 2020-12.
//!
//! ## Issue paths
//!
//! `jsonschema` reports JSON-pointer instance paths. They are converted to
//! [`PathToken`]s by walking the instance: a segment indexing an array
//! becomes [`PathToken::Index`], anything else a key. A `required` failure
//! is reported at the object, so the missing property is appended to
//! point at the field that needs the message.
//!
//! The compiled validator is memoized by schema and options identity.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formshape_core::{PathToken, StructuralSchema};
use formshape_schema::ValidationIssue;

use crate::adapter::{ValidationAdapter, ValidationResult};
use crate::artifacts::SchemaArtifacts;
use crate::cache::{Identity, MemoCache};
use crate::error::AdapterError;

/// Library tag of [`JsonSchemaAdapter`].
pub const LIBRARY: &str = "jsonschema";

/// Compilation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSchemaOptions {
    /// Enforce `format` keywords (`email`, `date`, ...).
    pub validate_formats: bool,
}

impl Default for JsonSchemaOptions {
    fn default() -> Self {
        Self {
            validate_formats: true,
        }
    }
}

/// Adapter validating with the `jsonschema` crate.
pub struct JsonSchemaAdapter {
    schema: Arc<StructuralSchema>,
    artifacts: Arc<SchemaArtifacts>,
    validator: Arc<Validator>,
}

impl JsonSchemaAdapter {
    /// Build an adapter with default options.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Schema`] for a non-object root and
    /// [`AdapterError::ValidatorBuild`] when `jsonschema` rejects the
    /// document.
    pub fn new(schema: Arc<StructuralSchema>, cache: &MemoCache) -> Result<Self, AdapterError> {
        Self::with_options(schema, Arc::new(JsonSchemaOptions::default()), cache)
    }

    /// Build an adapter with explicit options. Reusing the same `options`
    /// object reuses the compiled validator.
    ///
    /// # Errors
    ///
    /// As [`JsonSchemaAdapter::new`].
    pub fn with_options(
        schema: Arc<StructuralSchema>,
        options: Arc<JsonSchemaOptions>,
        cache: &MemoCache,
    ) -> Result<Self, AdapterError> {
        let artifacts = SchemaArtifacts::cached(cache, &schema)?;
        let identity = Identity::new(LIBRARY, &schema).with_options(&options);
        let validator = cache.get_or_try_insert_with(identity, || compile(schema.document(), &options))?;
        Ok(Self {
            schema,
            artifacts,
            validator,
        })
    }
}

impl fmt::Debug for JsonSchemaAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaAdapter")
            .field("hash", &self.artifacts.hash)
            .finish_non_exhaustive()
    }
}

fn compile(document: &Value, options: &JsonSchemaOptions) -> Result<Validator, AdapterError> {
    let mut prepared = document.clone();
    rewrite_nullable(&mut prepared);

    let mut opts = jsonschema::options();
    if prepared.get("$schema").is_none() {
        opts.with_draft(Draft::Draft202012);
    }
    opts.should_validate_formats(options.validate_formats);

    tracing::debug!(validate_formats = options.validate_formats, "compiling JSON Schema validator");
    opts.build(&prepared).map_err(|e| AdapterError::ValidatorBuild {
        reason: e.to_string(),
    })
}

/// Replace `nullable: true` with a `null` type, recursively.
fn rewrite_nullable(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if matches!(map.remove("nullable"), Some(Value::Bool(true))) {
                match map.get_mut("type") {
                    Some(Value::String(ty)) if ty != "null" => {
                        let ty = std::mem::take(ty);
                        map.insert("type".to_string(), Value::from(vec![ty, "null".to_string()]));
                    }
                    Some(Value::Array(types)) if !types.iter().any(|t| t == "null") => {
                        types.push(Value::from("null"));
                    }
                    _ => {}
                }
                if let Some(Value::Array(values)) = map.get_mut("enum") {
                    if !values.contains(&Value::Null) {
                        values.push(Value::Null);
                    }
                }
            }
            for child in map.values_mut() {
                rewrite_nullable(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_nullable),
        _ => {}
    }
}

/// Convert a JSON-pointer instance path into path tokens.
fn pointer_to_path(instance: &Value, pointer: &str) -> Vec<PathToken> {
    let mut path = Vec::new();
    let mut node = Some(instance);
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        let token = match (node, segment.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(index)) => {
                node = items.get(index);
                PathToken::Index(index)
            }
            (Some(Value::Object(map)), _) => {
                node = map.get(&segment);
                PathToken::Key(segment)
            }
            _ => {
                node = None;
                PathToken::Key(segment)
            }
        };
        path.push(token);
    }
    path
}

#[async_trait]
impl ValidationAdapter for JsonSchemaAdapter {
    fn library(&self) -> &str {
        LIBRARY
    }

    fn schema(&self) -> &Arc<StructuralSchema> {
        &self.schema
    }

    fn artifacts(&self) -> &SchemaArtifacts {
        &self.artifacts
    }

    async fn validate(&self, data: &Value) -> Result<ValidationResult, AdapterError> {
        let issues: Vec<ValidationIssue> = self
            .validator
            .iter_errors(data)
            .map(|error| {
                let mut path = pointer_to_path(data, &error.instance_path.to_string());
                if let ValidationErrorKind::Required { property } = &error.kind {
                    if let Some(name) = property.as_str() {
                        path.push(PathToken::Key(name.to_string()));
                    }
                }
                ValidationIssue::new(error.to_string(), path)
            })
            .collect();
        tracing::debug!(issues = issues.len(), "validated against JSON Schema");
        Ok(ValidationResult::from_issues(data, issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Arc<StructuralSchema> {
        Arc::new(
            StructuralSchema::from_value(json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "minLength": 2},
                    "nickname": {"type": "string", "nullable": true},
                    "addresses": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"street": {"type": "string"}},
                            "required": ["street"]
                        }
                    }
                },
                "required": ["name"]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn pointer_segments_follow_the_instance() {
        let data = json!({"a": [{"0": "x"}], "b": {"1": true}});
        assert_eq!(
            pointer_to_path(&data, "/a/0/0"),
            vec![PathToken::from("a"), PathToken::from(0), PathToken::from("0")]
        );
        assert_eq!(pointer_to_path(&data, "/b/1"), vec![PathToken::from("b"), PathToken::from("1")]);
        assert!(pointer_to_path(&data, "").is_empty());
        assert_eq!(pointer_to_path(&data, "/c~1d~0e"), vec![PathToken::from("c/d~e")]);
    }

    #[test]
    fn nullable_is_rewritten_to_a_null_type() {
        let mut doc = json!({
            "type": "object",
            "properties": {
                "a": {"type": "string", "nullable": true},
                "b": {"type": ["integer"], "nullable": true, "enum": [1, 2]},
                "c": {"type": "string", "nullable": false}
            }
        });
        rewrite_nullable(&mut doc);
        assert_eq!(doc["properties"]["a"], json!({"type": ["string", "null"]}));
        assert_eq!(doc["properties"]["b"], json!({"type": ["integer", "null"], "enum": [1, 2, null]}));
        assert_eq!(doc["properties"]["c"], json!({"type": "string"}));
    }

    #[tokio::test]
    async fn valid_data_succeeds() {
        let adapter = JsonSchemaAdapter::new(schema(), &MemoCache::new()).unwrap();
        let data = json!({"name": "Ada", "nickname": null, "addresses": [{"street": "Main"}]});
        let result = adapter.validate(&data).await.unwrap();
        assert_eq!(result, ValidationResult::Success { data });
    }

    #[tokio::test]
    async fn issues_carry_schema_relative_paths() {
        let adapter = JsonSchemaAdapter::new(schema(), &MemoCache::new()).unwrap();
        let data = json!({"name": "A", "addresses": [{"street": "Main"}, {}]});
        let result = adapter.validate(&data).await.unwrap();
        let mut paths: Vec<Vec<PathToken>> = result.issues().iter().map(|i| i.path.clone()).collect();
        paths.sort_by_key(|p| p.len());
        assert_eq!(
            paths,
            vec![
                vec![PathToken::from("name")],
                vec![PathToken::from("addresses"), PathToken::from(1), PathToken::from("street")],
            ]
        );
    }

    #[tokio::test]
    async fn missing_root_property_points_at_the_field() {
        let adapter = JsonSchemaAdapter::new(schema(), &MemoCache::new()).unwrap();
        let result = adapter.validate(&json!({})).await.unwrap();
        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.issues()[0].path, vec![PathToken::from("name")]);
        assert!(result.issues()[0].message.contains("name"));
    }

    #[test]
    fn compiled_validator_is_shared_per_schema_and_options() {
        let cache = MemoCache::new();
        let s = schema();
        let options = Arc::new(JsonSchemaOptions::default());
        let a = JsonSchemaAdapter::with_options(Arc::clone(&s), Arc::clone(&options), &cache).unwrap();
        let b = JsonSchemaAdapter::with_options(Arc::clone(&s), Arc::clone(&options), &cache).unwrap();
        assert!(Arc::ptr_eq(&a.validator, &b.validator));
        // artifacts + one validator
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalid_document_fails_to_build() {
        let s = Arc::new(
            StructuralSchema::from_value(json!({
                "type": "object",
                "properties": {"a": {"type": "string", "pattern": "("}}
            }))
            .unwrap(),
        );
        let err = JsonSchemaAdapter::new(s, &MemoCache::new()).unwrap_err();
        assert!(matches!(err, AdapterError::ValidatorBuild { .. }));
    }
}
