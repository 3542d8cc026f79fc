//! # Schema Walker
//!
//! Classifies a [`SchemaNode`] into a normalized [`SchemaInfo`] descriptor.
//! Every derived artifact (defaults, constraints, shapes, hashes) is built
//! on top of this classification, so it must stay a pure function of the
//! node and its required-ness.
//!
//! ## Rules
//!
//! - A node is **optional** when its parent does not require its key, or
//!   when the node declares a `default`.
//! - A node is **nullable** when it declares `nullable: true`, lists
//!   `null` among its types, or is a union containing a null branch.
//!   Null branches are removed from the union; nullability is recorded
//!   separately and never appears as a union arm.
//! - A union left with a single branch after null removal is unwrapped:
//!   the branch replaces the node for further classification.
//! - A union with two or more non-null branches is preserved.

use serde_json::Value;

use crate::schema::{ArrayNode, NodeKind, ObjectNode, PrimitiveType, SchemaNode};

/// Normalized descriptor of one schema node.
///
/// Exactly one of `union`, `array`, `properties` is populated, or none for
/// a pure leaf.
#[derive(Debug, Clone)]
pub struct SchemaInfo<'a> {
    /// The effective node after null-union unwrapping.
    pub node: &'a SchemaNode,
    /// Declared types, `null` excluded. Union types are the concatenation
    /// of their branches' types.
    pub types: Vec<PrimitiveType>,
    pub is_nullable: bool,
    pub is_optional: bool,
    /// The declared default, outer node first.
    pub default: Option<&'a Value>,
    /// Non-null union branches, when two or more remain.
    pub union: Option<Vec<&'a SchemaNode>>,
    /// Item schemas of an array node.
    pub array: Option<&'a ArrayNode>,
    /// Property payload of an object node.
    pub properties: Option<&'a ObjectNode>,
}

impl<'a> SchemaInfo<'a> {
    /// True when the node's types include `array` or it carries items.
    pub fn is_array(&self) -> bool {
        self.array.is_some() || self.types.contains(&PrimitiveType::Array)
    }

    /// True when the node's types include `object` or it carries properties.
    pub fn is_object(&self) -> bool {
        self.properties.is_some() || self.types.contains(&PrimitiveType::Object)
    }

    /// True for a node with no nested structure.
    pub fn is_leaf(&self) -> bool {
        self.union.is_none() && self.array.is_none() && self.properties.is_none()
    }

    /// Classify the property `key` of this object node.
    ///
    /// Returns `None` when this is not an object node or has no such key.
    pub fn property(&self, key: &str) -> Option<SchemaInfo<'a>> {
        let object = self.properties?;
        let node = object.property(key)?;
        Some(classify(node, !object.is_required(key)))
    }

    /// Classify the properties of this object node in document order.
    pub fn property_infos(&self) -> Vec<(&'a str, SchemaInfo<'a>)> {
        match self.properties {
            Some(object) => object
                .properties
                .iter()
                .map(|(key, node)| (key.as_str(), classify(node, !object.is_required(key))))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Classify each union branch or array item, inheriting this node's
    /// optionality.
    pub fn branch_infos(&self) -> Vec<SchemaInfo<'a>> {
        let nodes: Vec<&'a SchemaNode> = match (&self.union, self.array) {
            (Some(branches), _) => branches.clone(),
            (None, Some(array)) => array.items.iter().collect(),
            (None, None) => Vec::new(),
        };
        nodes
            .into_iter()
            .map(|node| classify(node, self.is_optional))
            .collect()
    }
}

/// Classify `node`.
///
/// `is_optional` is true when the parent object does not list this node's
/// key in `required`. The root of a schema is classified as required.
pub fn classify(node: &SchemaNode, is_optional: bool) -> SchemaInfo<'_> {
    let outer_default = node.default.as_ref();
    let mut is_nullable = node.nullable || node.has_type(&PrimitiveType::Null);
    let mut effective = node;

    // Strip null arms; unwrap single-branch unions.
    let mut union = None;
    if let NodeKind::Union(branches) = &node.kind {
        let non_null: Vec<&SchemaNode> = branches.iter().filter(|b| !b.is_null_literal()).collect();
        if non_null.len() < branches.len() {
            is_nullable = true;
        }
        match non_null.len() {
            0 => {}
            1 => {
                effective = non_null[0];
                is_nullable |= effective.nullable || effective.has_type(&PrimitiveType::Null);
            }
            _ => union = Some(non_null),
        }
    }

    let default = outer_default.or(effective.default.as_ref());
    let is_optional = is_optional || default.is_some();

    let mut types = Vec::new();
    collect_types(effective, &mut types);
    // `null` reached through a branch's type list.
    is_nullable |= types.contains(&PrimitiveType::Null);
    types.retain(|t| *t != PrimitiveType::Null);

    let (array, properties) = if union.is_some() {
        (None, None)
    } else {
        match &effective.kind {
            NodeKind::Array(array) => (Some(array), None),
            NodeKind::Object(object) => (None, Some(object)),
            // A nested union reached through unwrapping keeps its branches.
            NodeKind::Union(branches) => {
                let non_null: Vec<&SchemaNode> =
                    branches.iter().filter(|b| !b.is_null_literal()).collect();
                if non_null.len() > 1 {
                    union = Some(non_null);
                }
                (None, None)
            }
            NodeKind::Leaf => (None, None),
        }
    };

    SchemaInfo {
        node: effective,
        types,
        is_nullable,
        is_optional,
        default,
        union,
        array,
        properties,
    }
}

fn collect_types(node: &SchemaNode, out: &mut Vec<PrimitiveType>) {
    for ty in &node.types {
        if !out.contains(ty) {
            out.push(ty.clone());
        }
    }
    if let NodeKind::Union(branches) = &node.kind {
        for branch in branches {
            collect_types(branch, out);
        }
    }
}
