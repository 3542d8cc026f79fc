//! # Schema Hash — Structural Fingerprints
//!
//! Produces a short, stable identifier for a schema's structure. Two
//! schemas built on different calls but describing the same shape hash
//! to the same [`SchemaHash`], which makes the hash usable as a secondary
//! cache key and as the default form id.
//!
//! ## Canonical text
//!
//! The walker descriptor of each node is rendered as:
//!
//! - `Object {\n  key: <sub>,\n  ...\n}` with properties in document order,
//! - `Array[<item>|<item>]`,
//! - `Union {\n  <branch>|<branch>\n}`,
//! - or the sorted leaf type names joined with `|`,
//!
//! each followed by `|null` when nullable and `|undefined` when optional.
//! Nesting depth indents the rendering, so moving a property between
//! levels changes the text.
//!
//! ## Digest
//!
//! The text is folded with a 32-bit polynomial string hash
//! (`h = h * 31 + unit` over UTF-16 code units, wrapping), reinterpreted
//! as unsigned and rendered in base 36. The hash is not cryptographic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{SchemaNode, StructuralSchema};
use crate::walker::{classify, SchemaInfo};

/// Base-36 rendering of a schema's structural fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaHash(String);

impl SchemaHash {
    /// Hash an already-rendered canonical text.
    pub fn from_text(text: &str) -> Self {
        Self(to_base36(hash_code(text)))
    }

    /// The hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the structural hash of a schema.
pub fn schema_hash(schema: &StructuralSchema) -> SchemaHash {
    SchemaHash::from_text(&schema_text(schema.root()))
}

/// Render the canonical text of a node, classified as required.
pub fn schema_text(node: &SchemaNode) -> String {
    render(&classify(node, false), 0)
}

fn render(info: &SchemaInfo<'_>, depth: usize) -> String {
    let tab = "  ".repeat(depth);

    if info.union.is_some() {
        let branches = render_branches(info, depth);
        return format!("Union {{\n  {tab}{branches}\n{tab}}}{}", nullish(info));
    }

    if let Some(object) = info.properties {
        let fields: Vec<String> = object
            .properties
            .iter()
            .map(|(key, prop)| {
                let prop_info = classify(prop, !object.is_required(key));
                format!("{key}: {}", render(&prop_info, depth + 1))
            })
            .collect();
        return format!(
            "Object {{\n  {tab}{}\n{tab}}}{}",
            fields.join(",\n  "),
            nullish(info)
        );
    }

    if info.array.is_some() {
        return format!("Array[{}]{}", render_branches(info, depth), nullish(info));
    }

    let mut names: Vec<&str> = info.types.iter().map(|t| t.as_str()).collect();
    names.sort_unstable();
    format!("{}{}", names.join("|"), nullish(info))
}

fn render_branches(info: &SchemaInfo<'_>, depth: usize) -> String {
    info.branch_infos()
        .iter()
        .map(|branch| render(branch, depth + 1))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

fn nullish(info: &SchemaInfo<'_>) -> String {
    let mut out = String::new();
    if info.is_nullable {
        out.push_str("|null");
    }
    if info.is_optional {
        out.push_str("|undefined");
    }
    out
}

/// 32-bit polynomial string hash over UTF-16 code units.
fn hash_code(text: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    // Two's-complement reinterpretation: negative hashes become unsigned.
    hash as u32
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
