//! # Validation Adapters
//!
//! Defines the [`ValidationAdapter`] trait every validation library binding
//! implements. The form pipeline only ever calls through this trait: it
//! reads the schema-derived artifacts and awaits [`ValidationAdapter::validate`],
//! whatever library sits behind it.
//!
//! Adapters translate their library's native errors into
//! [`ValidationIssue`]s whose paths are root-relative and follow the
//! schema's own nesting.
//!
//! [`CustomAdapter`] wraps a handwritten check function; the
//! [`JsonSchemaAdapter`](crate::JsonSchemaAdapter) validates the structural
//! schema document itself.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formshape_core::StructuralSchema;
use formshape_schema::{ConstraintMap, ErrorShape, ValidationIssue};

use crate::artifacts::SchemaArtifacts;
use crate::cache::MemoCache;
use crate::error::AdapterError;

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The data is valid; `data` is what the library returned for it.
    Success { data: Value },
    /// The data is invalid.
    Failure { issues: Vec<ValidationIssue> },
}

impl ValidationResult {
    /// `Success` when `issues` is empty, else `Failure`.
    pub fn from_issues(data: &Value, issues: Vec<ValidationIssue>) -> Self {
        if issues.is_empty() {
            Self::Success { data: data.clone() }
        } else {
            Self::Failure { issues }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Issues of a failure; empty on success.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { issues } => issues,
        }
    }
}

/// Uniform interface over validation libraries.
///
/// The trait is object-safe (`Send + Sync`) so adapters can be held as
/// `Arc<dyn ValidationAdapter>` and shared between concurrent requests.
#[async_trait]
pub trait ValidationAdapter: Send + Sync {
    /// Tag naming the wrapped library.
    fn library(&self) -> &str;

    /// The structural schema this adapter validates against.
    fn schema(&self) -> &Arc<StructuralSchema>;

    /// Artifacts derived from [`Self::schema`].
    fn artifacts(&self) -> &SchemaArtifacts;

    fn defaults(&self) -> &Value {
        &self.artifacts().defaults
    }

    fn constraints(&self) -> &ConstraintMap {
        &self.artifacts().constraints
    }

    fn shape(&self) -> &ErrorShape {
        &self.artifacts().shape
    }

    /// Validate `data`. Invalid data is a `Failure`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the library could not run at all.
    async fn validate(&self, data: &Value) -> Result<ValidationResult, AdapterError>;
}

type CheckFn = dyn Fn(&Value) -> Vec<ValidationIssue> + Send + Sync;

/// Adapter around a handwritten check function.
pub struct CustomAdapter {
    library: String,
    schema: Arc<StructuralSchema>,
    artifacts: Arc<SchemaArtifacts>,
    check: Box<CheckFn>,
}

impl CustomAdapter {
    /// Wrap `check`, deriving artifacts for `schema` through `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Schema`] when the schema root is not an
    /// object.
    pub fn new<F>(schema: Arc<StructuralSchema>, cache: &MemoCache, check: F) -> Result<Self, AdapterError>
    where
        F: Fn(&Value) -> Vec<ValidationIssue> + Send + Sync + 'static,
    {
        let artifacts = SchemaArtifacts::cached(cache, &schema)?;
        Ok(Self {
            library: "custom".to_string(),
            schema,
            artifacts,
            check: Box::new(check),
        })
    }

    /// Override the library tag.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }
}

impl fmt::Debug for CustomAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAdapter")
            .field("library", &self.library)
            .field("hash", &self.artifacts.hash)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ValidationAdapter for CustomAdapter {
    fn library(&self) -> &str {
        &self.library
    }

    fn schema(&self) -> &Arc<StructuralSchema> {
        &self.schema
    }

    fn artifacts(&self) -> &SchemaArtifacts {
        &self.artifacts
    }

    async fn validate(&self, data: &Value) -> Result<ValidationResult, AdapterError> {
        Ok(ValidationResult::from_issues(data, (self.check)(data)))
    }
}
