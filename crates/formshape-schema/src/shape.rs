//! # Error Shapes
//!
//! Builds the tree of schema paths that are *containers*: nodes that
//! collect their own messages under `_errors` instead of being assigned a
//! message list directly. The error mapper consults this tree to decide
//! where each issue lands.
//!
//! A single recursive walk serves every use, parametrized by a
//! [`ShapePolicy`] that says which node kinds count as containers:
//!
//! | Policy | Marks arrays | Marks objects |
//! |--------|--------------|---------------|
//! | [`ShapePolicy::ERRORS`] | yes | yes |
//! | [`ShapePolicy::ARRAYS`] | yes | only as ancestors |
//! | [`ShapePolicy::OBJECTS`] | only as ancestors | yes |
//!
//! Array indices never appear in the tree: an array's entry describes
//! every one of its items at once.
//!
//! ## Unions
//!
//! Union branches are shaped individually and merged key-wise. A union is
//! a container when any branch is, so a union of leaves is a leaf, while an
//! array is a container even when its items are leaves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use formshape_core::{classify, PathToken, PrimitiveType, SchemaError, SchemaInfo, StructuralSchema};

/// Which node kinds the shape walk marks as containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapePolicy {
    pub arrays: bool,
    pub objects: bool,
}

impl ShapePolicy {
    /// Arrays and objects: the shape used for error mapping.
    pub const ERRORS: Self = Self {
        arrays: true,
        objects: true,
    };
    /// Array paths only.
    pub const ARRAYS: Self = Self {
        arrays: true,
        objects: false,
    };
    /// Object paths only.
    pub const OBJECTS: Self = Self {
        arrays: false,
        objects: true,
    };

    /// Parse a policy name: `errors`, `arrays` or `objects`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "errors" => Some(Self::ERRORS),
            "arrays" => Some(Self::ARRAYS),
            "objects" => Some(Self::OBJECTS),
            _ => None,
        }
    }
}

impl Default for ShapePolicy {
    fn default() -> Self {
        Self::ERRORS
    }
}

/// A node of the container tree. Keys are property names; an empty node
/// is a container with no container descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorShape(BTreeMap<String, ErrorShape>);

impl ErrorShape {
    /// The child shape under `key`.
    pub fn get(&self, key: &str) -> Option<&ErrorShape> {
        self.0.get(key)
    }

    /// True when the tree marks the path formed by `tokens` as a
    /// container. Index tokens are skipped; an empty path is the root,
    /// which always is one.
    pub fn contains(&self, tokens: &[PathToken]) -> bool {
        let mut node = self;
        for token in tokens.iter().filter(|t| t.as_index().is_none()) {
            match node.get(token.as_key().as_ref()) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }

    /// True when no path below this node is a container.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate child keys and shapes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorShape)> {
        self.0.iter()
    }

    fn merge(&mut self, other: ErrorShape) {
        for (key, shape) in other.0 {
            self.0.entry(key).or_default().merge(shape);
        }
    }
}

/// Build the container tree of an object schema.
///
/// # Errors
///
/// Returns [`SchemaError::NotAnObject`] when the root is not an object
/// schema.
pub fn build_shape(schema: &StructuralSchema, policy: ShapePolicy) -> Result<ErrorShape, SchemaError> {
    let info = classify(schema.root(), false);
    if info.properties.is_none() {
        return Err(SchemaError::NotAnObject {
            found: info.node.kind.name().to_string(),
        });
    }
    tracing::trace!(?policy, "building error shape");
    Ok(shape_of(&info, policy).unwrap_or_default())
}

/// Shape of one classified node, or `None` for a leaf.
pub fn shape_of(info: &SchemaInfo<'_>, policy: ShapePolicy) -> Option<ErrorShape> {
    if info.union.is_some() || info.array.is_some() {
        let mut merged = ErrorShape::default();
        let mut container = false;
        for branch in info.branch_infos() {
            if let Some(shape) = shape_of(&branch, policy) {
                container = true;
                merged.merge(shape);
            }
        }
        if info.array.is_some() {
            return (policy.arrays || container).then_some(merged);
        }
        return container.then_some(merged);
    }

    if info.properties.is_some() {
        let mut children = BTreeMap::new();
        for (key, child) in info.property_infos() {
            if let Some(shape) = shape_of(&child, policy) {
                children.insert(key.to_string(), shape);
            }
        }
        return (policy.objects || !children.is_empty()).then_some(ErrorShape(children));
    }

    // Untyped containers: `{"type": "array"}` without items and the like.
    let marked = (policy.arrays && info.types.contains(&PrimitiveType::Array))
        || (policy.objects && info.types.contains(&PrimitiveType::Object));
    marked.then(ErrorShape::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formshape_core::split_path;
    use serde_json::{json, Value};

    fn schema(doc: Value) -> StructuralSchema {
        StructuralSchema::from_value(doc).unwrap()
    }

    fn sample() -> StructuralSchema {
        schema(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "address": {
                    "type": "object",
                    "properties": {
                        "street": {"type": "string"},
                        "lines": {"type": "array", "items": {"type": "string"}}
                    }
                },
                "people": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}}
                    }
                },
                "choice": {"anyOf": [{"type": "string"}, {"type": "number"}]},
                "blob": {"type": "object"}
            }
        }))
    }

    #[test]
    fn errors_policy_marks_arrays_and_objects() {
        let shape = build_shape(&sample(), ShapePolicy::ERRORS).unwrap();
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({
                "tags": {},
                "address": {"lines": {}},
                "people": {},
                "blob": {}
            })
        );
    }

    #[test]
    fn arrays_policy_keeps_objects_only_as_ancestors() {
        let shape = build_shape(&sample(), ShapePolicy::ARRAYS).unwrap();
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({"tags": {}, "address": {"lines": {}}, "people": {}})
        );
    }

    #[test]
    fn objects_policy_keeps_arrays_only_as_ancestors() {
        let shape = build_shape(&sample(), ShapePolicy::OBJECTS).unwrap();
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({"address": {}, "people": {}, "blob": {}})
        );
    }

    #[test]
    fn union_of_leaves_is_not_a_container() {
        let shape = build_shape(&sample(), ShapePolicy::ERRORS).unwrap();
        assert!(shape.get("choice").is_none());
        assert!(shape.get("name").is_none());
    }

    #[test]
    fn union_of_objects_merges_keys() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "contact": {"anyOf": [
                    {"type": "object", "properties": {"emails": {"type": "array", "items": {"type": "string"}}}},
                    {"type": "object", "properties": {"phones": {"type": "array", "items": {"type": "string"}}}}
                ]}
            }
        }));
        let shape = build_shape(&s, ShapePolicy::ERRORS).unwrap();
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({"contact": {"emails": {}, "phones": {}}})
        );
    }

    #[test]
    fn nullable_array_is_still_a_container() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "ids": {"anyOf": [{"type": "array", "items": {"type": "integer"}}, {"type": "null"}]}
            }
        }));
        let shape = build_shape(&s, ShapePolicy::ERRORS).unwrap();
        assert!(shape.get("ids").is_some());
    }

    #[test]
    fn non_object_root_is_rejected() {
        let s = schema(json!({"type": "array", "items": {"type": "string"}}));
        let err = build_shape(&s, ShapePolicy::ERRORS).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject { .. }));
    }

    #[test]
    fn contains_skips_indices() {
        let shape = build_shape(&sample(), ShapePolicy::ERRORS).unwrap();
        assert!(shape.contains(&split_path("people[3]")));
        assert!(shape.contains(&split_path("address.lines")));
        assert!(shape.contains(&[]));
        assert!(!shape.contains(&split_path("people[0].name")));
        assert!(!shape.contains(&split_path("name")));
    }

    #[test]
    fn policy_names() {
        assert_eq!(ShapePolicy::from_name("arrays"), Some(ShapePolicy::ARRAYS));
        assert_eq!(ShapePolicy::from_name("errors"), Some(ShapePolicy::default()));
        assert_eq!(ShapePolicy::from_name("leaves"), None);
    }
}
