//! # Structural Schema Model
//!
//! The canonical in-memory representation of a validation schema. Every
//! adapter, whatever library it wraps, describes its schema as a
//! JSON-Schema-flavoured document; [`StructuralSchema::from_value`] parses
//! that document into a tree of [`SchemaNode`]s that the rest of the
//! engine walks.
//!
//! ## Recognised keywords
//!
//! `type` (string or array), `properties`, `required`,
//! `additionalProperties`, `items` (schema or tuple), `prefixItems`,
//! `anyOf`, `oneOf`, `enum`, `const`, `default`, `nullable`, `format`,
//! `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`,
//! `multipleOf`, `minLength`, `maxLength`, `pattern`, `minItems`,
//! `maxItems`, `title`, `description`. Everything else is ignored.
//!
//! ## Invariants
//!
//! - Node kind is derived from the document alone. When `type` is absent,
//!   `properties` implies an object and `items` implies an array.
//! - Boolean sub-schemas are rejected with [`SchemaError::BooleanSchema`]:
//!   no shape can be derived from them.
//! - Property order follows the document order.
//! - The parsed tree is immutable once built and is shared behind `Arc`
//!   by callers that cache derived artifacts.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::error::{display_pointer, FormshapeError, SchemaError};

/// A primitive type name as declared by the `type` keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array,
    /// A type name outside the JSON Schema vocabulary, kept verbatim.
    Other(String),
}

impl PrimitiveType {
    /// Parse a `type` keyword entry.
    pub fn parse(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "object" => Self::Object,
            "array" => Self::Array,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the type name as written in a schema document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Object => "object",
            Self::Array => "array",
            Self::Other(name) => name,
        }
    }

    /// True for `number` and `integer`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared numeric, string, and array bounds of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

/// Object node payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    /// Properties in document order.
    pub properties: Vec<(String, SchemaNode)>,
    /// Names listed in `required`.
    pub required: Vec<String>,
    /// False only when `additionalProperties: false` was declared.
    pub additional_properties: bool,
}

impl ObjectNode {
    /// Whether `key` is listed in `required`.
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    /// Look up a property schema by name.
    pub fn property(&self, key: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }
}

/// Array node payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayNode {
    /// Item schemas. One element for a homogeneous array, one per
    /// position for a tuple, empty when items are unconstrained.
    pub items: Vec<SchemaNode>,
    /// True when `items` was declared positionally.
    pub tuple: bool,
}

impl ArrayNode {
    /// The item schema governing position `index`.
    pub fn item_at(&self, index: usize) -> Option<&SchemaNode> {
        if self.tuple {
            self.items.get(index)
        } else {
            self.items.first()
        }
    }
}

/// Structural kind of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A primitive value site.
    Leaf,
    Object(ObjectNode),
    Array(ArrayNode),
    /// `anyOf`/`oneOf` branches in declared order.
    Union(Vec<SchemaNode>),
}

impl NodeKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Union(_) => "union",
        }
    }
}

/// One node of the structural schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Declared types in document order, deduplicated. May contain `null`.
    pub types: Vec<PrimitiveType>,
    pub kind: NodeKind,
    /// `nullable: true` was declared.
    pub nullable: bool,
    /// `Some(Value::Null)` for `default: null`, `None` when absent.
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    /// `Some(Value::Null)` for `const: null`, `None` when absent.
    pub const_value: Option<Value>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub bounds: Bounds,
}

impl SchemaNode {
    /// A leaf node of the given types with no other keywords.
    pub fn leaf(types: impl IntoIterator<Item = PrimitiveType>) -> Self {
        let mut node = Self::empty(NodeKind::Leaf);
        for t in types {
            push_unique(&mut node.types, t);
        }
        node
    }

    fn empty(kind: NodeKind) -> Self {
        Self {
            types: Vec::new(),
            kind,
            nullable: false,
            default: None,
            enum_values: None,
            const_value: None,
            format: None,
            title: None,
            description: None,
            bounds: Bounds::default(),
        }
    }

    /// The object payload, if this is an object node.
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match &self.kind {
            NodeKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The array payload, if this is an array node.
    pub fn as_array(&self) -> Option<&ArrayNode> {
        match &self.kind {
            NodeKind::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// True when this node is exactly the `null` type: `{"type": "null"}`
    /// or `{"const": null}`.
    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
            && (self.types == [PrimitiveType::Null]
                || matches!(self.const_value, Some(Value::Null)))
    }

    /// Whether the declared types include `ty`.
    pub fn has_type(&self, ty: &PrimitiveType) -> bool {
        self.types.contains(ty)
    }
}

/// A parsed structural schema together with the document it came from.
///
/// The document is kept so that adapters delegating to a JSON Schema
/// validator can compile it unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSchema {
    document: Value,
    root: SchemaNode,
}

impl StructuralSchema {
    /// Parse a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::BooleanSchema`] if any reachable sub-schema
    /// is `true`/`false`, [`SchemaError::NotASchema`] for non-object nodes,
    /// and [`SchemaError::InvalidKeyword`] for keywords carrying values of
    /// the wrong JSON type.
    pub fn from_value(document: Value) -> Result<Self, SchemaError> {
        let root = parse_node(&document, "")?;
        Ok(Self { document, root })
    }

    /// Parse a schema document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FormshapeError::Serialization`] for invalid JSON and
    /// [`FormshapeError::Schema`] for an invalid schema.
    pub fn from_json_str(text: &str) -> Result<Self, FormshapeError> {
        let document: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(document)?)
    }

    /// The original schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The root node of the parsed tree.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The root object payload.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`] when the root is not an object
    /// schema.
    pub fn root_object(&self) -> Result<&ObjectNode, SchemaError> {
        self.root.as_object().ok_or_else(|| SchemaError::NotAnObject {
            found: self.root.kind.name().to_string(),
        })
    }
}

fn push_unique(types: &mut Vec<PrimitiveType>, ty: PrimitiveType) {
    if !types.contains(&ty) {
        types.push(ty);
    }
}

/// Escape a property name for use as a JSON pointer segment.
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn invalid(pointer: &str, keyword: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidKeyword {
        path: display_pointer(pointer),
        keyword: keyword.to_string(),
        reason: reason.into(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_node(value: &Value, pointer: &str) -> Result<SchemaNode, SchemaError> {
    let map = match value {
        Value::Object(map) => map,
        Value::Bool(_) => {
            return Err(SchemaError::BooleanSchema {
                path: display_pointer(pointer),
            })
        }
        other => {
            return Err(SchemaError::NotASchema {
                path: display_pointer(pointer),
                found: json_type_name(other).to_string(),
            })
        }
    };

    let mut node = SchemaNode::empty(NodeKind::Leaf);
    node.types = parse_types(map, pointer)?;
    node.nullable = opt_bool(map, "nullable", pointer)?.unwrap_or(false);
    node.default = map.get("default").cloned();
    node.const_value = map.get("const").cloned();
    node.enum_values = match map.get("enum") {
        None => None,
        Some(Value::Array(values)) => Some(values.clone()),
        Some(_) => return Err(invalid(pointer, "enum", "expected an array")),
    };
    node.format = opt_string(map, "format", pointer)?;
    node.title = opt_string(map, "title", pointer)?;
    node.description = opt_string(map, "description", pointer)?;
    node.bounds = parse_bounds(map, pointer)?;

    if node.types.is_empty() && matches!(node.const_value, Some(Value::Null)) {
        node.types.push(PrimitiveType::Null);
    }

    let mut branches = Vec::new();
    for keyword in ["anyOf", "oneOf"] {
        match map.get(keyword) {
            None => {}
            Some(Value::Array(items)) => {
                for (i, branch) in items.iter().enumerate() {
                    branches.push(parse_node(branch, &format!("{pointer}/{keyword}/{i}"))?);
                }
            }
            Some(_) => return Err(invalid(pointer, keyword, "expected an array of schemas")),
        }
    }

    let declares_object = node.has_type(&PrimitiveType::Object)
        || (node.types.is_empty() && map.contains_key("properties"));
    let declares_array = node.has_type(&PrimitiveType::Array)
        || (node.types.is_empty()
            && (map.contains_key("items") || map.contains_key("prefixItems")));

    node.kind = if !branches.is_empty() {
        NodeKind::Union(branches)
    } else if declares_object {
        push_unique(&mut node.types, PrimitiveType::Object);
        NodeKind::Object(parse_object(map, pointer)?)
    } else if declares_array {
        push_unique(&mut node.types, PrimitiveType::Array);
        NodeKind::Array(parse_array(map, pointer)?)
    } else {
        NodeKind::Leaf
    };

    Ok(node)
}

fn parse_types(map: &Map<String, Value>, pointer: &str) -> Result<Vec<PrimitiveType>, SchemaError> {
    let mut types = Vec::new();
    match map.get("type") {
        None => {}
        Some(Value::String(name)) => types.push(parse_type(name, pointer)),
        Some(Value::Array(names)) => {
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid(pointer, "type", "type arrays must contain strings"))?;
                push_unique(&mut types, parse_type(name, pointer));
            }
        }
        Some(_) => return Err(invalid(pointer, "type", "expected a string or an array of strings")),
    }
    Ok(types)
}

fn parse_type(name: &str, pointer: &str) -> PrimitiveType {
    let ty = PrimitiveType::parse(name);
    if let PrimitiveType::Other(other) = &ty {
        tracing::debug!(path = %display_pointer(pointer), type_name = %other, "unrecognised type name");
    }
    ty
}

fn parse_object(map: &Map<String, Value>, pointer: &str) -> Result<ObjectNode, SchemaError> {
    let mut object = ObjectNode {
        additional_properties: true,
        ..ObjectNode::default()
    };

    match map.get("properties") {
        None => {}
        Some(Value::Object(props)) => {
            for (key, prop) in props {
                let child = format!("{pointer}/properties/{}", escape_segment(key));
                object.properties.push((key.clone(), parse_node(prop, &child)?));
            }
        }
        Some(_) => return Err(invalid(pointer, "properties", "expected an object")),
    }

    match map.get("required") {
        None => {}
        Some(Value::Array(names)) => {
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid(pointer, "required", "expected an array of strings"))?;
                object.required.push(name.to_string());
            }
        }
        Some(_) => return Err(invalid(pointer, "required", "expected an array of strings")),
    }

    // A schema-valued additionalProperties still admits extra keys.
    object.additional_properties = !matches!(map.get("additionalProperties"), Some(Value::Bool(false)));

    Ok(object)
}

fn parse_array(map: &Map<String, Value>, pointer: &str) -> Result<ArrayNode, SchemaError> {
    let mut array = ArrayNode::default();

    if let Some(prefix) = map.get("prefixItems") {
        let items = prefix
            .as_array()
            .ok_or_else(|| invalid(pointer, "prefixItems", "expected an array of schemas"))?;
        for (i, item) in items.iter().enumerate() {
            array.items.push(parse_node(item, &format!("{pointer}/prefixItems/{i}"))?);
        }
        array.tuple = true;
        // `items` after `prefixItems` only closes or extends the tuple.
        return Ok(array);
    }

    match map.get("items") {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                array.items.push(parse_node(item, &format!("{pointer}/items/{i}"))?);
            }
            array.tuple = true;
        }
        Some(item) => array.items.push(parse_node(item, &format!("{pointer}/items"))?),
    }

    Ok(array)
}

fn parse_bounds(map: &Map<String, Value>, pointer: &str) -> Result<Bounds, SchemaError> {
    let mut bounds = Bounds {
        minimum: opt_number(map, "minimum", pointer)?,
        maximum: opt_number(map, "maximum", pointer)?,
        multiple_of: opt_number(map, "multipleOf", pointer)?,
        min_length: opt_u64(map, "minLength", pointer)?,
        max_length: opt_u64(map, "maxLength", pointer)?,
        pattern: opt_string(map, "pattern", pointer)?,
        min_items: opt_u64(map, "minItems", pointer)?,
        max_items: opt_u64(map, "maxItems", pointer)?,
        ..Bounds::default()
    };

    // Draft 4 spells exclusive bounds as booleans qualifying minimum/maximum.
    match map.get("exclusiveMinimum") {
        None => {}
        Some(Value::Bool(true)) => bounds.exclusive_minimum = bounds.minimum.take(),
        Some(Value::Bool(false)) => {}
        Some(Value::Number(n)) => bounds.exclusive_minimum = Some(n.clone()),
        Some(_) => return Err(invalid(pointer, "exclusiveMinimum", "expected a number")),
    }
    match map.get("exclusiveMaximum") {
        None => {}
        Some(Value::Bool(true)) => bounds.exclusive_maximum = bounds.maximum.take(),
        Some(Value::Bool(false)) => {}
        Some(Value::Number(n)) => bounds.exclusive_maximum = Some(n.clone()),
        Some(_) => return Err(invalid(pointer, "exclusiveMaximum", "expected a number")),
    }

    Ok(bounds)
}

fn opt_number(map: &Map<String, Value>, keyword: &str, pointer: &str) -> Result<Option<Number>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(invalid(pointer, keyword, "expected a number")),
    }
}

fn opt_u64(map: &Map<String, Value>, keyword: &str, pointer: &str) -> Result<Option<u64>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(pointer, keyword, "expected a non-negative integer")),
    }
}

fn opt_string(map: &Map<String, Value>, keyword: &str, pointer: &str) -> Result<Option<String>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(pointer, keyword, "expected a string")),
    }
}

fn opt_bool(map: &Map<String, Value>, keyword: &str, pointer: &str) -> Result<Option<bool>, SchemaError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid(pointer, keyword, "expected a boolean")),
    }
}
