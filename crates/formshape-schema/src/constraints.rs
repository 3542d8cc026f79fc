//! # Input Constraints
//!
//! Derives HTML input validation attributes (`required`, `min`, `max`,
//! `minlength`, `maxlength`, `pattern`, `step`) from a schema, keyed by
//! dotted field path.
//!
//! ## Path scheme
//!
//! Object properties join with `.`. Arrays never produce per-index
//! entries: the item schema's constraints are emitted once under the
//! template path `<array>[]`, so `tags[]` and `addresses[].street` apply
//! to every repeated field.
//!
//! ## Unrepresentable constraints
//!
//! Some schema bounds have no attribute equivalent. They are logged with
//! `tracing::warn!` and omitted:
//!
//! - patterns using back-references (`\1`, `\k<name>`),
//! - exclusive bounds on non-integer numbers.
//!
//! The map is computed once per schema and is read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use formshape_core::{classify, PrimitiveType, SchemaInfo, StructuralSchema};

/// Attribute set for one input field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlength: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Number>,
}

impl InputConstraints {
    /// True when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` onto `self`; attributes set in `other` win.
    pub fn merge(&mut self, other: InputConstraints) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(required, min, max, minlength, maxlength, pattern, step);
    }
}

/// Constraints for every constrained field of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintMap(BTreeMap<String, InputConstraints>);

impl ConstraintMap {
    /// Constraints for a field path such as `address.street` or `tags[]`.
    pub fn get(&self, path: &str) -> Option<&InputConstraints> {
        self.0.get(path)
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputConstraints)> {
        self.0.iter()
    }

    /// Number of constrained fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Extract the constraint map of a schema.
pub fn constraints(schema: &StructuralSchema) -> ConstraintMap {
    let mut out = BTreeMap::new();
    if let Some(root) = walk(&classify(schema.root(), false), "", &mut out) {
        out.insert(String::new(), root);
    }
    ConstraintMap(out)
}

/// Collect entries for containers below `info` into `out` and return the
/// constraints of `info` itself when it is a leaf or a union of leaves.
fn walk(
    info: &SchemaInfo<'_>,
    path: &str,
    out: &mut BTreeMap<String, InputConstraints>,
) -> Option<InputConstraints> {
    if info.union.is_some() {
        let branches = info.branch_infos();
        let mut merged: Option<InputConstraints> = None;
        for branch in &branches {
            if let Some(c) = walk(branch, path, out) {
                merged.get_or_insert_with(InputConstraints::default).merge(c);
            }
        }
        let relaxed = info.is_nullable
            || info.is_optional
            || branches.iter().any(|b| b.is_nullable || b.is_optional);
        if let Some(m) = merged.as_mut() {
            if relaxed {
                m.required = None;
            }
        }
        return merged.filter(|m| !m.is_empty());
    }

    if info.array.is_some() {
        let item_path = format!("{path}[]");
        let mut merged: Option<InputConstraints> = None;
        for item in info.branch_infos() {
            if let Some(c) = walk(&item, &item_path, out) {
                merged.get_or_insert_with(InputConstraints::default).merge(c);
            }
        }
        if let Some(m) = merged.filter(|m| !m.is_empty()) {
            out.insert(item_path, m);
        }
        return None;
    }

    if info.properties.is_some() {
        for (key, child) in info.property_infos() {
            let child_path = if path.is_empty() {
                key.to_string()
            } else {
                format!("{path}.{key}")
            };
            if let Some(c) = walk(&child, &child_path, out) {
                out.insert(child_path, c);
            }
        }
        return None;
    }

    let c = leaf_constraints(info, path);
    (!c.is_empty()).then_some(c)
}

fn leaf_constraints(info: &SchemaInfo<'_>, path: &str) -> InputConstraints {
    let bounds = &info.node.bounds;
    let mut c = InputConstraints::default();

    if info.types == [PrimitiveType::String] {
        if let Some(pattern) = &bounds.pattern {
            if uses_back_reference(pattern) {
                tracing::warn!(
                    path,
                    pattern = %pattern,
                    "pattern uses back-references and has no input attribute form; constraint omitted"
                );
            } else {
                c.pattern = Some(pattern.clone());
            }
        }
        c.minlength = bounds.min_length.filter(|n| *n > 0);
        c.maxlength = bounds.max_length;
    } else if !info.types.is_empty() && info.types.iter().all(PrimitiveType::is_numeric) {
        let integer = info.types == [PrimitiveType::Integer];

        c.min = match (&bounds.minimum, &bounds.exclusive_minimum) {
            (Some(min), _) => Some(min.clone()),
            (None, Some(ex)) if integer => shift(ex, true),
            (None, Some(ex)) => {
                tracing::warn!(path, exclusive_minimum = %ex, "exclusive minimum on a non-integer number; constraint omitted");
                None
            }
            (None, None) => None,
        };
        c.max = match (&bounds.maximum, &bounds.exclusive_maximum) {
            (Some(max), _) => Some(max.clone()),
            (None, Some(ex)) if integer => shift(ex, false),
            (None, Some(ex)) => {
                tracing::warn!(path, exclusive_maximum = %ex, "exclusive maximum on a non-integer number; constraint omitted");
                None
            }
            (None, None) => None,
        };
        c.step = match &bounds.multiple_of {
            Some(step) => Some(step.clone()),
            None if integer => Some(Number::from(1)),
            None => None,
        };
    }

    if !info.is_nullable && !info.is_optional {
        c.required = Some(true);
    }
    c
}

/// The nearest integer strictly above (`up`) or below an exclusive bound.
fn shift(bound: &Number, up: bool) -> Option<Number> {
    if let Some(i) = bound.as_i64() {
        let shifted = if up { i.checked_add(1) } else { i.checked_sub(1) };
        return shifted.map(Number::from);
    }
    if let Some(u) = bound.as_u64() {
        let shifted = if up { u.checked_add(1) } else { u.checked_sub(1) };
        return shifted.map(Number::from);
    }
    let f = bound.as_f64()?;
    let shifted = if up { f.floor() + 1.0 } else { f.ceil() - 1.0 };
    if shifted.abs() < 9.0e15 {
        Some(Number::from(shifted as i64))
    } else {
        Number::from_f64(shifted)
    }
}

/// Detect `\1`..`\9` and `\k<name>` back-references.
fn uses_back_reference(pattern: &str) -> bool {
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            continue;
        }
        match chars.next() {
            Some('1'..='9') => return true,
            Some('k') if chars.peek() == Some(&'<') => return true,
            _ => {}
        }
    }
    false
}
