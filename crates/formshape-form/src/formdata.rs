//! # Wire Format
//!
//! Converts between flat `key → value` submissions (`a.b[0].c=1`) and
//! nested JSON values.
//!
//! ## Unflattening
//!
//! Entries are grouped by key in first-submission order. A key submitted
//! more than once assigns the ordered list of its values; otherwise the
//! single value is assigned. Missing intermediate nodes are created as an
//! array when the next token is numeric (`[0]` or a dotted `0`) and as an
//! object otherwise. Array positions skipped by the submission are `null`.
//!
//! A key that contradicts an earlier one (`a=1` followed by `a.b=2`), or
//! whose index lies more than [`MAX_INDEX_GAP`] past the end of its array,
//! is logged and skipped.
//!
//! ## Coercion
//!
//! Wire values are strings. [`coerce`] converts them to the types the
//! schema declares for their fields:
//!
//! - `number` and `integer` leaves parse their text; unparseable text is
//!   kept for the validator to reject,
//! - `boolean` leaves are `false` for `""` and `"false"`, else `true`,
//! - an empty string on another non-string leaf becomes `null` when the
//!   field is nullable, is removed when it is optional, and is replaced by
//!   the field's default otherwise,
//! - a single value submitted for an array field is wrapped in an array.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use formshape_core::{classify, join_path, split_path, PathToken, PrimitiveType, SchemaInfo, StructuralSchema};
use formshape_schema::synthesize;

use crate::error::FormDataError;

/// Reserved wire key carrying the form id.
pub const ID_KEY: &str = "__formshape_id";

/// How far past the end of an array a wire index may reach. Entries
/// beyond it are skipped, so a single key cannot force a huge allocation.
pub const MAX_INDEX_GAP: usize = 1024;

/// A submission as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePayload {
    /// Flat multi-value entries in submission order.
    Entries(Vec<(String, Value)>),
    /// An already nested object, passed through unchanged.
    Nested(Value),
}

impl WirePayload {
    /// Entries from `key=value` strings. A string without `=` is a key
    /// submitted with an empty value.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Entries(
            pairs
                .into_iter()
                .map(|pair| match pair.split_once('=') {
                    Some((key, value)) => (key.to_string(), Value::String(value.to_string())),
                    None => (pair.to_string(), Value::String(String::new())),
                })
                .collect(),
        )
    }
}

/// Remove every [`ID_KEY`] entry, returning the first string id found.
pub fn take_id(entries: &mut Vec<(String, Value)>) -> Option<String> {
    let mut id = None;
    entries.retain(|(key, value)| {
        if key != ID_KEY {
            return true;
        }
        if id.is_none() {
            id = value.as_str().map(str::to_string);
        }
        false
    });
    id
}

/// Build a nested object from flat entries.
pub fn unflatten(entries: &[(String, Value)]) -> Value {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&Value>> = HashMap::new();
    for (key, value) in entries {
        grouped
            .entry(key.as_str())
            .or_insert_with(|| {
                order.push(key.as_str());
                Vec::new()
            })
            .push(value);
    }

    let mut root = Value::Object(Map::new());
    for key in order {
        let values = grouped.remove(key).unwrap_or_default();
        let value = match values.as_slice() {
            [single] => (*single).clone(),
            many => Value::Array(many.iter().map(|v| (*v).clone()).collect()),
        };
        assign(&mut root, key, value);
    }
    root
}

fn assign(root: &mut Value, key: &str, value: Value) {
    let tokens = split_path(key);
    let Some((last, init)) = tokens.split_last() else {
        tracing::warn!(key, "wire key designates no field; entry skipped");
        return;
    };

    let mut node = root;
    for (i, token) in init.iter().enumerate() {
        let slot = match slot_mut(node, token) {
            Ok(slot) => slot,
            Err(blocked) => {
                tracing::warn!(key, at = %join_path(&tokens[..=i]), "{blocked}; entry skipped");
                return;
            }
        };
        if slot.is_null() {
            let next = &tokens[i + 1];
            *slot = if next.as_index().is_some() {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
        node = slot;
    }

    match slot_mut(node, last) {
        Ok(slot) if slot.is_null() => *slot = value,
        Ok(_) => tracing::warn!(key, "wire key assigned twice with different shapes; entry skipped"),
        Err(blocked) => tracing::warn!(key, "{blocked}; entry skipped"),
    }
}

/// Why a wire key cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blocked {
    NotContainer,
    IndexTooFar,
}

impl std::fmt::Display for Blocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotContainer => f.write_str("wire key crosses a non-container value"),
            Self::IndexTooFar => write!(f, "wire index lies more than {MAX_INDEX_GAP} past the end of its array"),
        }
    }
}

/// The slot `token` designates inside `node`, created as `null` if
/// missing. An index may extend an array by at most [`MAX_INDEX_GAP`]
/// positions.
fn slot_mut<'a>(node: &'a mut Value, token: &PathToken) -> Result<&'a mut Value, Blocked> {
    match node {
        Value::Object(map) => Ok(map.entry(token.as_key().into_owned()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = token.as_index().ok_or(Blocked::NotContainer)?;
            if items.len() <= index {
                if index - items.len() >= MAX_INDEX_GAP {
                    return Err(Blocked::IndexTooFar);
                }
                let len = index.checked_add(1).ok_or(Blocked::IndexTooFar)?;
                items.resize(len, Value::Null);
            }
            items.get_mut(index).ok_or(Blocked::IndexTooFar)
        }
        _ => Err(Blocked::NotContainer),
    }
}

/// Flatten a nested value into `(path, leaf)` entries, the inverse of
/// [`unflatten`]. Empty arrays and objects below the root are emitted as
/// values at their own path.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    fn walk(value: &Value, prefix: &mut Vec<PathToken>, out: &mut Vec<(String, Value)>) {
        match value {
            Value::Object(map) if map.is_empty() && !prefix.is_empty() => {
                out.push((join_path(prefix), Value::Object(Map::new())));
            }
            Value::Array(items) if items.is_empty() && !prefix.is_empty() => {
                out.push((join_path(prefix), Value::Array(Vec::new())));
            }
            Value::Object(map) => {
                for (key, child) in map {
                    prefix.push(PathToken::Key(key.clone()));
                    walk(child, prefix, out);
                    prefix.pop();
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    prefix.push(PathToken::Index(i));
                    walk(child, prefix, out);
                    prefix.pop();
                }
            }
            leaf => out.push((join_path(prefix), leaf.clone())),
        }
    }

    let mut out = Vec::new();
    walk(value, &mut Vec::new(), &mut out);
    out
}

/// Coerce wire strings in `data` to the types `schema` declares.
pub fn coerce(data: Value, schema: &StructuralSchema) -> Value {
    coerce_node(data, &classify(schema.root(), false)).unwrap_or(Value::Null)
}

/// `None` removes the field.
fn coerce_node(value: Value, info: &SchemaInfo<'_>) -> Option<Value> {
    if info.properties.is_some() {
        let Value::Object(map) = value else {
            return Some(value);
        };
        let mut out = Map::new();
        for (key, child) in map {
            match info.property(&key) {
                Some(child_info) => {
                    if let Some(v) = coerce_node(child, &child_info) {
                        out.insert(key, v);
                    }
                }
                None => {
                    out.insert(key, child);
                }
            }
        }
        return Some(Value::Object(out));
    }

    if let Some(array) = info.array {
        let items = match value {
            Value::Array(items) => items,
            Value::String(s) if s.is_empty() => return coerce_empty(info),
            Value::Null => return Some(Value::Null),
            single => vec![single],
        };
        let coerced = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match array.item_at(i) {
                Some(node) => coerce_node(item, &classify(node, false)).unwrap_or(Value::Null),
                None => item,
            })
            .collect();
        return Some(Value::Array(coerced));
    }

    let Value::String(text) = value else {
        return Some(value);
    };

    if info.union.is_some() {
        return if text.is_empty() {
            coerce_empty(info)
        } else {
            Some(Value::String(text))
        };
    }

    if info.types.is_empty() || info.types.contains(&PrimitiveType::String) {
        return Some(Value::String(text));
    }
    if info.types.contains(&PrimitiveType::Boolean) {
        return Some(Value::Bool(!(text.is_empty() || text == "false")));
    }
    if text.is_empty() {
        return coerce_empty(info);
    }
    if info.types.contains(&PrimitiveType::Integer) {
        if let Ok(n) = text.trim().parse::<i64>() {
            return Some(Value::from(n));
        }
    }
    if info.types.contains(&PrimitiveType::Number) {
        if let Some(n) = parse_number(text.trim()) {
            return Some(Value::Number(n));
        }
    }
    Some(Value::String(text))
}

fn coerce_empty(info: &SchemaInfo<'_>) -> Option<Value> {
    if info.is_nullable {
        Some(Value::Null)
    } else if info.is_optional {
        None
    } else {
        synthesize(info)
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Number::from(n));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Deep-merge `data` over `defaults`. Objects merge key-wise; any other
/// submitted value replaces the default.
pub fn merge_over(defaults: &Value, data: Value) -> Value {
    match (defaults, data) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut out = base.clone();
            for (key, value) in overlay {
                let merged = match base.get(&key) {
                    Some(default) => merge_over(default, value),
                    None => value,
                };
                out.insert(key, merged);
            }
            Value::Object(out)
        }
        (_, data) => data,
    }
}

/// Turn a payload into nested form data plus any submitted form id.
///
/// # Errors
///
/// Returns [`FormDataError::NotAnObject`] for a nested payload that is not
/// an object.
pub fn read_payload(
    payload: WirePayload,
    schema: Option<&StructuralSchema>,
) -> Result<(Option<String>, Value), FormDataError> {
    match payload {
        WirePayload::Entries(mut entries) => {
            let id = take_id(&mut entries);
            let data = unflatten(&entries);
            let data = match schema {
                Some(schema) => coerce(data, schema),
                None => data,
            };
            Ok((id, data))
        }
        WirePayload::Nested(value @ Value::Object(_)) => Ok((None, value)),
        WirePayload::Nested(other) => Err(FormDataError::NotAnObject {
            found: json_type(&other).to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            "[ -~]{0,8}".prop_map(Value::String),
            any::<i64>().prop_map(Value::from),
        ]
    }

    fn graph() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 48, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn root() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-z]{1,4}", graph(), 1..5)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        /// Flattening then unflattening reproduces the graph.
        #[test]
        fn flatten_round_trip(g in root()) {
            prop_assert_eq!(unflatten(&flatten(&g)), g);
        }
    }
}
