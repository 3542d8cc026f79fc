//! # formshape-schema — Schema-Derived Form Artifacts
//!
//! Everything a form needs to know about a schema before any data arrives,
//! plus the mapping of validation issues back onto the form.
//!
//! ## Default Values (`defaults`)
//!
//! [`default_values`] synthesizes the instance a blank form starts from.
//! Synthesis is total: what cannot be derived is left absent.
//!
//! ## Input Constraints (`constraints`)
//!
//! [`constraints`] derives HTML validation attributes per field path.
//! Array items are described once, under `<array>[]`.
//!
//! ## Error Shapes (`shape`)
//!
//! [`build_shape`] marks container paths under a [`ShapePolicy`]. The
//! `errors` policy drives the error mapper; `arrays` and `objects` serve
//! callers that only track one kind.
//!
//! ## Error Mapping (`errors`)
//!
//! [`map_errors`] places path-addressed [`ValidationIssue`]s into an
//! [`ErrorTree`], using the shape to decide between a container's
//! `_errors` list and a direct message list.
//!
//! ## Crate Policy
//!
//! - Depends only on `formshape-core` internally.
//! - Every artifact is a pure function of the schema; results are freshly
//!   allocated and safe to cache.

pub mod constraints;
pub mod defaults;
pub mod errors;
pub mod shape;

pub use constraints::{constraints, ConstraintMap, InputConstraints};
pub use defaults::{default_values, synthesize};
pub use errors::{flatten_errors, map_errors, ErrorTree, ValidationIssue, ERRORS_KEY};
pub use shape::{build_shape, shape_of, ErrorShape, ShapePolicy};
