//! # formshape-form — Form Submission Pipeline
//!
//! Connects submitted data to schema validation and back to the form.
//!
//! ## Wire Format (`formdata`)
//!
//! [`unflatten`] builds nested data from flat `a.b[0]=x` entries and
//! [`flatten`] reverses it. [`coerce`] turns wire strings into the types
//! the schema declares.
//!
//! ## Adapters (`adapter`, `json_schema`)
//!
//! [`ValidationAdapter`] is the only contract the pipeline has with a
//! validation library. [`JsonSchemaAdapter`] validates the structural
//! schema document with the `jsonschema` crate; [`CustomAdapter`] wraps a
//! handwritten check.
//!
//! ## Caching (`cache`, `artifacts`)
//!
//! [`MemoCache`] stores compiled validators and [`SchemaArtifacts`] keyed
//! by schema object identity. It is an owned value; nothing is global.
//!
//! ## Pipeline (`form`, `config`)
//!
//! [`validate_form`] turns a payload into a [`ValidatedForm`] according to
//! an [`EngineConfig`].
//!
//! ## Crate Policy
//!
//! - Invalid user input is data (issues and error trees), never an `Err`.
//! - Schema errors and adapter build failures always propagate.
//! - No locks are held across `.await` points.

pub mod adapter;
pub mod artifacts;
pub mod cache;
pub mod config;
pub mod error;
pub mod form;
pub mod formdata;
pub mod json_schema;

pub use adapter::{CustomAdapter, ValidationAdapter, ValidationResult};
pub use artifacts::SchemaArtifacts;
pub use cache::{Identity, MemoCache};
pub use config::{ConfigError, EngineConfig};
pub use error::{AdapterError, FormDataError, FormError};
pub use form::{validate_form, ValidatedForm};
pub use formdata::{
    coerce, flatten, merge_over, read_payload, take_id, unflatten, WirePayload, ID_KEY, MAX_INDEX_GAP,
};
pub use json_schema::{JsonSchemaAdapter, JsonSchemaOptions};
