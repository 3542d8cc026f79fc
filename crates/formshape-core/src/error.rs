//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by every formshape crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Schema errors are programming-time mistakes in a schema document.
//!   They always carry the path of the offending node and are never
//!   silently recovered.
//! - Path errors reject inputs that cannot designate a location at all.
//! - Data-dependent validation failures are NOT errors. They travel as
//!   issues inside a validation result.

use thiserror::Error;

/// Top-level error type for formshape.
#[derive(Error, Debug)]
pub enum FormshapeError {
    /// The schema document is malformed for the requested operation.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The structural schema document is malformed for the operation requested.
///
/// The `path` fields render the location of the node inside the schema
/// document as a JSON pointer (`/properties/name/items`), or `(root)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A `true`/`false` schema was found where a node with shape
    /// information is required.
    #[error("boolean schema at {path}: no shape information can be derived")]
    BooleanSchema {
        /// Location of the boolean node.
        path: String,
    },

    /// A keyword carries a value of the wrong JSON type.
    #[error("invalid `{keyword}` at {path}: {reason}")]
    InvalidKeyword {
        /// Location of the node declaring the keyword.
        path: String,
        /// The keyword name.
        keyword: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The schema document is not a JSON object or boolean.
    #[error("schema node at {path} must be an object, found {found}")]
    NotASchema {
        /// Location of the node.
        path: String,
        /// JSON type that was found instead.
        found: String,
    },

    /// An operation requiring an object root was given another kind.
    #[error("root schema must be an object schema, found {found}")]
    NotAnObject {
        /// Kind of the root node.
        found: String,
    },
}

/// A field path could not designate a parent/key pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path contains no tokens.
    #[error("path must contain at least one segment")]
    EmptyPath,
}

/// Render a schema location as a display string.
pub(crate) fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "(root)".to_string()
    } else {
        pointer.to_string()
    }
}
