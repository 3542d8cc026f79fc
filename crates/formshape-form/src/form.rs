//! # Validated Form Record
//!
//! [`validate_form`] runs one submission through the pipeline and returns
//! the [`ValidatedForm`] route handlers and UI bindings consume:
//!
//! 1. No payload: the form was not posted. Data is the schema defaults,
//!    `valid` is false, and errors are empty unless forced on.
//! 2. Flat entries: the reserved id entry is extracted, the rest is
//!    unflattened and coerced. Nested payloads pass through.
//! 3. Unless strict, the data is deep-merged over the defaults.
//! 4. The adapter validates. Valid data replaces the input; issues are
//!    mapped into the error tree.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formshape_schema::{flatten_errors, map_errors, ConstraintMap, ErrorShape, ErrorTree, ValidationIssue};

use crate::adapter::{ValidationAdapter, ValidationResult};
use crate::config::EngineConfig;
use crate::error::FormError;
use crate::formdata::{merge_over, read_payload, WirePayload};

/// Result of validating one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedForm {
    pub id: String,
    pub valid: bool,
    pub posted: bool,
    pub data: Value,
    pub errors: ErrorTree,
    pub constraints: ConstraintMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(skip)]
    shape: ErrorShape,
}

impl ValidatedForm {
    /// Deserialize the form data into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, FormError> {
        Ok(T::deserialize(&self.data)?)
    }

    /// Add a handler-side error at a raw field path (`""` for the whole
    /// form) and mark the form invalid.
    pub fn set_error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.add(&ValidationIssue::at(path, message), &self.shape);
        self.valid = false;
    }

    /// Attach a status message.
    pub fn set_message<M: Serialize>(&mut self, message: &M) -> Result<(), FormError> {
        self.message = Some(serde_json::to_value(message)?);
        Ok(())
    }

    /// Every error list as `(path, messages)`.
    pub fn flat_errors(&self) -> Vec<(String, Vec<String>)> {
        flatten_errors(&self.errors)
    }
}

/// Validate a submission with `adapter`.
///
/// # Errors
///
/// Returns [`FormError`] when the payload is malformed or the adapter
/// cannot run. Invalid data is not an error.
pub async fn validate_form(
    adapter: &dyn ValidationAdapter,
    payload: Option<WirePayload>,
    config: &EngineConfig,
) -> Result<ValidatedForm, FormError> {
    let artifacts = adapter.artifacts();
    let shape = artifacts.shape.clone();

    let Some(payload) = payload else {
        let data = artifacts.defaults.clone();
        let errors = if config.errors == Some(true) {
            let result = adapter.validate(&data).await?;
            map_errors(result.issues(), &shape)
        } else {
            ErrorTree::new()
        };
        return Ok(ValidatedForm {
            id: config.id.clone().unwrap_or_else(|| artifacts.hash.to_string()),
            valid: false,
            posted: false,
            data,
            errors,
            constraints: artifacts.constraints.clone(),
            message: None,
            shape,
        });
    };

    let coerce_with = config.coerce.then(|| adapter.schema().as_ref());
    let (submitted_id, data) = read_payload(payload, coerce_with)?;
    let input = if config.strict {
        data
    } else {
        merge_over(&artifacts.defaults, data)
    };

    let (valid, data, issues) = match adapter.validate(&input).await? {
        ValidationResult::Success { data } => (true, data, Vec::new()),
        ValidationResult::Failure { issues } => (false, input, issues),
    };
    let errors = if config.errors == Some(false) {
        ErrorTree::new()
    } else {
        map_errors(&issues, &shape)
    };

    let id = config
        .id
        .clone()
        .or(submitted_id)
        .unwrap_or_else(|| artifacts.hash.to_string());
    tracing::debug!(id = %id, library = adapter.library(), valid, issues = issues.len(), "form validated");

    Ok(ValidatedForm {
        id,
        valid,
        posted: true,
        data,
        errors,
        constraints: artifacts.constraints.clone(),
        message: None,
        shape,
    })
}
