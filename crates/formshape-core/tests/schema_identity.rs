//! Integration tests: schema parsing, classification, and identity.
//!
//! Exercises the public surface of `formshape-core` the way downstream
//! crates use it: parse a document, classify nodes, fingerprint it, and
//! address values inside data shaped by it.

use formshape_core::{
    check_path, classify, schema_hash, split_path, FormshapeError, PathToken, PrimitiveType,
    SchemaError, StructuralSchema,
};
use serde_json::json;

fn registration() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "email": {"type": "string", "format": "email"},
            "age": {"anyOf": [{"type": "integer"}, {"type": "null"}]},
            "addresses": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "street": {"type": "string"},
                        "city": {"type": "string"}
                    },
                    "required": ["street"]
                }
            }
        },
        "required": ["name", "email", "age"]
    })
}

#[test]
fn test_path_parsing_scenario() {
    assert_eq!(
        split_path("a.b[0].c[1][2]"),
        vec![
            PathToken::from("a"),
            PathToken::from("b"),
            PathToken::from(0),
            PathToken::from("c"),
            PathToken::from(1),
            PathToken::from(2),
        ]
    );
}

#[test]
fn test_nullable_union_scenario() {
    let schema = StructuralSchema::from_value(json!({"anyOf": [{"type": "null"}, {"type": "string"}]}))
        .expect("schema parses");
    let info = classify(schema.root(), false);
    assert!(info.is_nullable);
    assert!(info.union.is_none());
    assert_eq!(info.types, vec![PrimitiveType::String]);
}

#[test]
fn test_hash_survives_reconstruction() {
    let a = StructuralSchema::from_json_str(&registration().to_string()).expect("parses");
    let b = StructuralSchema::from_value(registration()).expect("parses");
    assert_eq!(schema_hash(&a), schema_hash(&b));
}

#[test]
fn test_hash_tracks_required_set() {
    let mut relaxed = registration();
    relaxed["required"] = json!(["name"]);
    let a = StructuralSchema::from_value(registration()).expect("parses");
    let b = StructuralSchema::from_value(relaxed).expect("parses");
    assert_ne!(schema_hash(&a), schema_hash(&b));
}

#[test]
fn test_classified_properties_follow_document_order() {
    let schema = StructuralSchema::from_value(registration()).expect("parses");
    let root = classify(schema.root(), false);
    let names: Vec<&str> = root.property_infos().into_iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["name", "email", "age", "addresses"]);

    let age = root.property("age").expect("age is declared");
    assert!(age.is_nullable && !age.is_optional);

    let addresses = root.property("addresses").expect("addresses is declared");
    assert!(addresses.is_optional);
    let item = &addresses.branch_infos()[0];
    assert!(item.property("city").is_some_and(|c| c.is_optional));
}

#[test]
fn test_check_path_on_submitted_data() {
    let data = json!({"addresses": [{"street": "Main"}, {"street": "Side", "city": "Bergen"}]});
    let found = check_path(&data, &split_path("addresses[1].city"))
        .expect("non-empty path")
        .expect("parents exist");
    assert_eq!(found.value, Some(&json!("Bergen")));
    assert!(check_path(&data, &split_path("addresses[5].city")).expect("non-empty path").is_none());
}

#[test]
fn test_boolean_subschema_is_rejected_with_location() {
    let err = StructuralSchema::from_json_str(r#"{"type":"object","properties":{"x":{"items":false}}}"#)
        .expect_err("boolean sub-schema");
    match err {
        FormshapeError::Schema(SchemaError::BooleanSchema { path }) => {
            assert_eq!(path, "/properties/x/items");
        }
        other => panic!("unexpected error: {other}"),
    }
}
