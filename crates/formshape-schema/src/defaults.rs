//! # Default Values
//!
//! Synthesizes a concrete default instance from a schema. Defaults are a
//! best-effort convenience for pre-filling forms, not a correctness gate,
//! so synthesis never fails: anything it cannot derive is left absent.
//!
//! ## Resolution order (first match wins)
//!
//! 1. A declared `default` is used verbatim. On an object node an
//!    object-valued default overrides individual properties; properties
//!    it omits are still synthesized.
//! 2. A union branch declaring a `default` supplies it (first such branch).
//! 3. Optional nodes are absent; required nullable nodes are `null`.
//! 4. Objects synthesize each property, omitting absent ones.
//! 5. Arrays are empty.
//! 6. Other unions synthesize their first branch.
//! 7. `enum` yields its first value, `const` its constant.
//! 8. Leaves by first declared type: `""`, `0`, `false`, `null`, `{}`,
//!    `[]`. Unrecognised or missing types are absent.
//!
//! Absence is `None`. Values are freshly allocated and never alias the
//! schema document.
//!
//! ## Tie-breaks
//!
//! - Optionality is checked before nullability: an optional nullable
//!   field without a default is absent, not `null`.
//! - Among union branches the first one wins, both for declared defaults
//!   and for synthesis.

use serde_json::{Map, Value};

use formshape_core::{classify, ObjectNode, PrimitiveType, SchemaInfo, StructuralSchema};

/// Synthesize the default instance of a whole schema.
///
/// Returns `Value::Null` when the root itself has no derivable default.
pub fn default_values(schema: &StructuralSchema) -> Value {
    synthesize(&classify(schema.root(), false)).unwrap_or(Value::Null)
}

/// Synthesize the default of one classified node. `None` means absent.
pub fn synthesize(info: &SchemaInfo<'_>) -> Option<Value> {
    if let Some(default) = info.default {
        return match (info.properties, default) {
            (Some(object), Value::Object(overrides)) => {
                Some(Value::Object(object_defaults(object, Some(overrides))))
            }
            _ => Some(default.clone()),
        };
    }

    if let Some(branches) = &info.union {
        if let Some(default) = branches.iter().find_map(|b| b.default.as_ref()) {
            return Some(default.clone());
        }
    }

    if info.is_optional {
        return None;
    }
    if info.is_nullable {
        return Some(Value::Null);
    }

    if let Some(object) = info.properties {
        return Some(Value::Object(object_defaults(object, None)));
    }

    if info.array.is_some() {
        return Some(Value::Array(Vec::new()));
    }

    if let Some(branches) = &info.union {
        return branches
            .first()
            .and_then(|branch| synthesize(&classify(branch, false)));
    }

    if let Some(first) = info.node.enum_values.as_ref().and_then(|values| values.first()) {
        return Some(first.clone());
    }
    if let Some(constant) = &info.node.const_value {
        return Some(constant.clone());
    }

    info.types.first().and_then(leaf_default)
}

fn object_defaults(object: &ObjectNode, overrides: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, node) in &object.properties {
        if let Some(value) = overrides.and_then(|o| o.get(key)) {
            out.insert(key.clone(), value.clone());
            continue;
        }
        let child = classify(node, !object.is_required(key));
        if let Some(value) = synthesize(&child) {
            out.insert(key.clone(), value);
        }
    }
    // Keys the override declares beyond the schema's properties.
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

fn leaf_default(ty: &PrimitiveType) -> Option<Value> {
    match ty {
        PrimitiveType::String => Some(Value::String(String::new())),
        PrimitiveType::Number | PrimitiveType::Integer => Some(Value::from(0)),
        PrimitiveType::Boolean => Some(Value::Bool(false)),
        PrimitiveType::Null => Some(Value::Null),
        PrimitiveType::Object => Some(Value::Object(Map::new())),
        PrimitiveType::Array => Some(Value::Array(Vec::new())),
        PrimitiveType::Other(_) => None,
    }
}
