//! # Error Mapper
//!
//! Turns a flat list of path-addressed [`ValidationIssue`]s into the nested
//! error tree a form renders from. Placement is decided by an
//! [`ErrorShape`]:
//!
//! - an issue at a container path (array or object) is pushed onto that
//!   node's `_errors` list,
//! - an issue at any other path, including a numeric array position, is
//!   pushed onto a message list stored directly at the path,
//! - an issue with an empty path is a form-level error under the root
//!   `_errors`.
//!
//! Missing intermediate nodes are created as objects; array positions
//! become string keys (`{"tags": {"0": ["too short"]}}`). When a deeper
//! issue passes through a node that already holds a message list, the list
//! moves to that node's `_errors`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use formshape_core::{join_path, split_path, PathToken};

use crate::shape::ErrorShape;

/// Key under which containers collect their own messages.
pub const ERRORS_KEY: &str = "_errors";

/// One path-addressed validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub message: String,
    /// Root-relative path in schema nesting order. Empty for form-level
    /// issues.
    #[serde(default)]
    pub path: Vec<PathToken>,
}

impl ValidationIssue {
    /// An issue at `path`.
    pub fn new(message: impl Into<String>, path: Vec<PathToken>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }

    /// An issue at a raw path such as `addresses[0].street`.
    pub fn at(raw_path: &str, message: impl Into<String>) -> Self {
        Self::new(message, split_path(raw_path))
    }

    /// A form-level issue.
    pub fn form(message: impl Into<String>) -> Self {
        Self::new(message, Vec::new())
    }

    fn is_form_level(&self) -> bool {
        match self.path.as_slice() {
            [] => true,
            [only] => only.as_key().is_empty(),
            _ => false,
        }
    }
}

/// Nested error tree keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorTree(Map<String, Value>);

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Form-level messages.
    pub fn form_errors(&self) -> Vec<&str> {
        messages(self.0.get(ERRORS_KEY))
    }

    /// The subtree or message list at a raw path.
    pub fn get(&self, raw_path: &str) -> Option<&Value> {
        let tokens = split_path(raw_path);
        let (first, rest) = tokens.split_first()?;
        let mut node = self.0.get(first.as_key().as_ref())?;
        for token in rest {
            node = node.as_object()?.get(token.as_key().as_ref())?;
        }
        Some(node)
    }

    /// Place one issue according to `shape`.
    pub fn add(&mut self, issue: &ValidationIssue, shape: &ErrorShape) {
        if issue.is_form_level() {
            push_container_message(&mut self.0, &issue.message);
            return;
        }
        let Some((last, init)) = issue.path.split_last() else {
            return;
        };
        let container = last.as_index().is_none() && shape.contains(&issue.path);

        let mut node = &mut self.0;
        for token in init {
            let slot = node
                .entry(token.as_key().into_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = promote(std::mem::take(slot));
            }
            let Value::Object(next) = slot else {
                return;
            };
            node = next;
        }

        let slot = node
            .entry(last.as_key().into_owned())
            .or_insert_with(|| if container {
                Value::Object(Map::new())
            } else {
                Value::Array(Vec::new())
            });
        match slot {
            Value::Array(list) if !container => list.push(Value::String(issue.message.clone())),
            Value::Object(map) => push_container_message(map, &issue.message),
            other => {
                let mut promoted = promote(std::mem::take(other));
                if let Value::Object(map) = &mut promoted {
                    push_container_message(map, &issue.message);
                }
                *other = promoted;
            }
        }
    }
}

/// Wrap a message list (or stray scalar) into `{"_errors": [...]}`.
fn promote(previous: Value) -> Value {
    let mut map = Map::new();
    match previous {
        Value::Array(list) => {
            map.insert(ERRORS_KEY.to_string(), Value::Array(list));
        }
        Value::Null => {}
        scalar => {
            map.insert(ERRORS_KEY.to_string(), Value::Array(vec![scalar]));
        }
    }
    Value::Object(map)
}

fn push_container_message(map: &mut Map<String, Value>, message: &str) {
    let entry = map
        .entry(ERRORS_KEY.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let message = Value::String(message.to_string());
    match entry {
        Value::Array(list) => list.push(message),
        other => {
            let previous = std::mem::take(other);
            *other = Value::Array(vec![previous, message]);
        }
    }
}

fn messages(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Map issues into an error tree.
pub fn map_errors(issues: &[ValidationIssue], shape: &ErrorShape) -> ErrorTree {
    let mut tree = ErrorTree::new();
    for issue in issues {
        tree.add(issue, shape);
    }
    tree
}

/// List every message list in the tree as `(path, messages)` pairs.
///
/// Container messages are reported at the container's own path; the
/// form-level list has the empty path. Pairs are in path order.
pub fn flatten_errors(tree: &ErrorTree) -> Vec<(String, Vec<String>)> {
    fn walk(map: &Map<String, Value>, prefix: &mut Vec<PathToken>, out: &mut Vec<(String, Vec<String>)>) {
        for (key, value) in map {
            if key == ERRORS_KEY {
                let list = messages(Some(value)).into_iter().map(str::to_string).collect();
                out.push((join_path(prefix), list));
                continue;
            }
            let token = match key.parse::<usize>() {
                Ok(i) if key.bytes().all(|b| b.is_ascii_digit()) => PathToken::Index(i),
                _ => PathToken::Key(key.clone()),
            };
            prefix.push(token);
            match value {
                Value::Object(child) => walk(child, prefix, out),
                other => {
                    let list = messages(Some(other)).into_iter().map(str::to_string).collect();
                    out.push((join_path(prefix), list));
                }
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(&tree.0, &mut Vec::new(), &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{build_shape, ShapePolicy};
    use formshape_core::StructuralSchema;
    use serde_json::json;

    fn shape() -> ErrorShape {
        let schema = StructuralSchema::from_value(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "address": {
                    "type": "object",
                    "properties": {"street": {"type": "string"}}
                },
                "people": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"email": {"type": "string"}}}
                }
            }
        }))
        .unwrap();
        build_shape(&schema, ShapePolicy::ERRORS).unwrap()
    }

    #[test]
    fn leaf_issue_is_a_direct_list() {
        let tree = map_errors(&[ValidationIssue::at("name", "Required")], &shape());
        assert_eq!(tree.into_value(), json!({"name": ["Required"]}));
    }

    #[test]
    fn container_issue_goes_under_errors() {
        let tree = map_errors(
            &[
                ValidationIssue::at("tags", "At least one tag"),
                ValidationIssue::at("address", "Incomplete"),
            ],
            &shape(),
        );
        assert_eq!(
            tree.into_value(),
            json!({
                "tags": {"_errors": ["At least one tag"]},
                "address": {"_errors": ["Incomplete"]}
            })
        );
    }

    #[test]
    fn array_position_is_a_leaf_with_string_key() {
        let tree = map_errors(
            &[
                ValidationIssue::at("tags[1]", "Too short"),
                ValidationIssue::at("tags", "Too many"),
            ],
            &shape(),
        );
        assert_eq!(
            tree.into_value(),
            json!({"tags": {"1": ["Too short"], "_errors": ["Too many"]}})
        );
    }

    #[test]
    fn nested_issue_inside_array_of_objects() {
        let tree = map_errors(
            &[
                ValidationIssue::at("people[0].email", "Invalid email"),
                ValidationIssue::at("people[0].email", "Too long"),
            ],
            &shape(),
        );
        assert_eq!(
            tree.into_value(),
            json!({"people": {"0": {"email": ["Invalid email", "Too long"]}}})
        );
    }

    #[test]
    fn empty_path_is_form_level() {
        let tree = map_errors(
            &[
                ValidationIssue::form("Passwords do not match"),
                ValidationIssue::new("Also bad", vec![PathToken::Key(String::new())]),
            ],
            &shape(),
        );
        assert_eq!(tree.form_errors(), vec!["Passwords do not match", "Also bad"]);
    }

    #[test]
    fn deeper_issue_promotes_leaf_list() {
        let tree = map_errors(
            &[
                ValidationIssue::at("people[0]", "Bad entry"),
                ValidationIssue::at("people[0].email", "Invalid email"),
            ],
            &shape(),
        );
        assert_eq!(
            tree.into_value(),
            json!({"people": {"0": {"_errors": ["Bad entry"], "email": ["Invalid email"]}}})
        );
    }

    #[test]
    fn unknown_paths_are_leaves() {
        let tree = map_errors(&[ValidationIssue::at("extra.deep", "Unexpected")], &shape());
        assert_eq!(tree.get("extra.deep"), Some(&json!(["Unexpected"])));
    }

    #[test]
    fn flatten_lists_every_message_list() {
        let tree = map_errors(
            &[
                ValidationIssue::form("Form"),
                ValidationIssue::at("tags", "Too many"),
                ValidationIssue::at("tags[2]", "Empty"),
                ValidationIssue::at("people[0].email", "Invalid"),
            ],
            &shape(),
        );
        assert_eq!(
            flatten_errors(&tree),
            vec![
                (String::new(), vec!["Form".to_string()]),
                ("people[0].email".to_string(), vec!["Invalid".to_string()]),
                ("tags".to_string(), vec!["Too many".to_string()]),
                ("tags[2]".to_string(), vec!["Empty".to_string()]),
            ]
        );
    }

    #[test]
    fn issues_deserialize_from_mixed_paths() {
        let issue: ValidationIssue =
            serde_json::from_value(json!({"message": "m", "path": ["a", 0, "b"]})).unwrap();
        assert_eq!(issue, ValidationIssue::at("a[0].b", "m"));
    }
}
