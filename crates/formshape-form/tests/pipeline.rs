//! Integration tests: multipart-style submissions through the JSON Schema
//! adapter, from flat entries to the validated form record.

use std::sync::Arc;

use formshape_core::StructuralSchema;
use formshape_form::{
    validate_form, EngineConfig, JsonSchemaAdapter, MemoCache, ValidationAdapter, WirePayload,
};
use serde_json::{json, Value};

fn order_schema() -> Arc<StructuralSchema> {
    Arc::new(
        StructuralSchema::from_value(json!({
            "type": "object",
            "properties": {
                "customer": {"type": "string", "minLength": 2},
                "express": {"type": "boolean"},
                "note": {"type": "string", "nullable": true},
                "lines": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "sku": {"type": "string", "pattern": "^[A-Z]{3}-[0-9]+$"},
                            "qty": {"type": "integer", "minimum": 1}
                        },
                        "required": ["sku", "qty"]
                    }
                }
            },
            "required": ["customer", "express", "lines"]
        }))
        .expect("schema parses"),
    )
}

fn adapter(cache: &MemoCache) -> JsonSchemaAdapter {
    JsonSchemaAdapter::new(order_schema(), cache).expect("adapter builds")
}

#[tokio::test]
async fn test_valid_order_submission() {
    let cache = MemoCache::new();
    let adapter = adapter(&cache);
    let payload = WirePayload::from_pairs([
        "customer=Ada",
        "express=on",
        "lines[0].sku=ABC-1",
        "lines[0].qty=2",
        "lines[1].sku=XYZ-42",
        "lines[1].qty=1",
    ]);

    let form = validate_form(&adapter, Some(payload), &EngineConfig::default())
        .await
        .expect("pipeline runs");

    assert!(form.posted);
    assert!(form.valid, "unexpected errors: {:?}", form.flat_errors());
    assert_eq!(
        form.data,
        json!({
            "customer": "Ada",
            "express": true,
            "lines": [{"sku": "ABC-1", "qty": 2}, {"sku": "XYZ-42", "qty": 1}]
        })
    );
    assert_eq!(
        form.constraints.get("lines[].qty").and_then(|c| c.step.clone()),
        Some(1.into())
    );
}

#[tokio::test]
async fn test_invalid_order_maps_errors_onto_fields() {
    let cache = MemoCache::new();
    let adapter = adapter(&cache);
    let payload = WirePayload::from_pairs(["customer=A", "express=", "lines[0].sku=bad", "lines[0].qty=0"]);

    let form = validate_form(&adapter, Some(payload), &EngineConfig::default())
        .await
        .expect("pipeline runs");

    assert!(!form.valid);
    assert_eq!(form.data["express"], json!(false));
    let paths: Vec<String> = form.flat_errors().into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["customer", "lines[0].qty", "lines[0].sku"]);
}

#[tokio::test]
async fn test_empty_lines_is_a_container_error() {
    let cache = MemoCache::new();
    let adapter = adapter(&cache);
    let payload = WirePayload::Nested(json!({"customer": "Ada", "express": false, "lines": []}));

    let form = validate_form(&adapter, Some(payload), &EngineConfig::default())
        .await
        .expect("pipeline runs");

    let lines = form.errors.get("lines").expect("lines has errors");
    assert!(lines.get("_errors").and_then(Value::as_array).is_some_and(|l| l.len() == 1));
}

#[tokio::test]
async fn test_missing_required_field_points_at_field() {
    let cache = MemoCache::new();
    let adapter = adapter(&cache);
    let config = EngineConfig {
        strict: true,
        ..EngineConfig::default()
    };
    let payload = WirePayload::Nested(json!({"express": true, "lines": [{"sku": "ABC-1", "qty": 1}]}));

    let form = validate_form(&adapter, Some(payload), &config).await.expect("pipeline runs");

    let errors = form.errors.get("customer").and_then(Value::as_array).expect("customer error");
    assert!(errors[0].as_str().is_some_and(|m| m.contains("customer")));
}

#[tokio::test]
async fn test_concurrent_validations_share_one_adapter() {
    let cache = MemoCache::new();
    let adapter: Arc<dyn ValidationAdapter> = Arc::new(adapter(&cache));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let adapter = Arc::clone(&adapter);
        tasks.push(tokio::spawn(async move {
            let customer = if i % 2 == 0 { "Ada" } else { "A" };
            let payload = WirePayload::Nested(json!({
                "customer": customer,
                "express": false,
                "lines": [{"sku": "ABC-1", "qty": 1}]
            }));
            validate_form(adapter.as_ref(), Some(payload), &EngineConfig::default())
                .await
                .map(|form| form.valid)
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let valid = task.await.expect("task joins").expect("pipeline runs");
        assert_eq!(valid, i % 2 == 0);
    }
}

#[test]
fn test_adapters_for_the_same_schema_object_share_artifacts() {
    let cache = MemoCache::new();
    let schema = order_schema();
    let a = JsonSchemaAdapter::new(Arc::clone(&schema), &cache).expect("adapter builds");
    let b = JsonSchemaAdapter::new(Arc::clone(&schema), &cache).expect("adapter builds");
    assert!(std::ptr::eq(a.artifacts(), b.artifacts()));
}
