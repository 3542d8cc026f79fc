//! Schema-derived artifacts, computed once per schema object.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use formshape_core::{schema_hash, SchemaError, SchemaHash, StructuralSchema};
use formshape_schema::{build_shape, constraints, default_values, ConstraintMap, ErrorShape, ShapePolicy};

use crate::cache::{Identity, MemoCache};

/// Everything a form derives from its schema before data arrives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaArtifacts {
    pub defaults: Value,
    pub constraints: ConstraintMap,
    pub shape: ErrorShape,
    pub hash: SchemaHash,
}

impl SchemaArtifacts {
    /// Derive all artifacts of an object schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`] when the root is not an object.
    pub fn derive(schema: &StructuralSchema) -> Result<Self, SchemaError> {
        let shape = build_shape(schema, ShapePolicy::ERRORS)?;
        let artifacts = Self {
            defaults: default_values(schema),
            constraints: constraints(schema),
            shape,
            hash: schema_hash(schema),
        };
        tracing::debug!(
            hash = %artifacts.hash,
            constrained_fields = artifacts.constraints.len(),
            "derived schema artifacts"
        );
        Ok(artifacts)
    }

    /// Derive through `cache`, reusing the artifacts of the same schema
    /// object.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`] when the root is not an object.
    pub fn cached(cache: &MemoCache, schema: &Arc<StructuralSchema>) -> Result<Arc<Self>, SchemaError> {
        cache.get_or_try_insert_with(Identity::new("artifacts", schema), || Self::derive(schema))
    }
}
