//! # Form Errors
//!
//! Operational failures of the form pipeline. Invalid user input is not
//! an error here: it travels as issues inside a
//! [`ValidationResult`](crate::ValidationResult) and ends up in the form's
//! error tree.

use formshape_core::SchemaError;
use thiserror::Error;

/// A wire payload could not be turned into form data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormDataError {
    /// Nested payloads must be objects.
    #[error("form data must be an object, found {found}")]
    NotAnObject {
        /// JSON type that was submitted.
        found: String,
    },
}

/// A validation adapter could not run.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Artifacts could not be derived from the schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The wrapped library rejected the schema document.
    #[error("validator build failed: {reason}")]
    ValidatorBuild {
        /// Library diagnostic.
        reason: String,
    },

    /// The wrapped library failed while validating.
    #[error("{library} validation failed to run: {reason}")]
    Backend {
        /// Library tag of the adapter.
        library: String,
        /// Library diagnostic.
        reason: String,
    },
}

/// Top-level error of [`validate_form`](crate::validate_form).
#[derive(Error, Debug)]
pub enum FormError {
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("form data error: {0}")]
    FormData(#[from] FormDataError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
