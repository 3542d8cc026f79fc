//! # formshape-core — Foundational Types for formshape
//!
//! This crate is the leaf of the formshape workspace. It defines the
//! structural schema model every other crate walks, and the primitives
//! for addressing values inside nested form data.
//!
//! ## Key Design Principles
//!
//! 1. **One schema model.** Whatever validation library produced a schema,
//!    it reaches the engine as a JSON-Schema-flavoured document parsed
//!    into [`StructuralSchema`]. The engine never inspects a library's
//!    native schema types.
//!
//! 2. **One classification.** [`classify`] normalizes optionality,
//!    nullability, and unions. Defaults, constraints, shapes, and hashes
//!    are all derived from its [`SchemaInfo`] so they agree on what a
//!    node is.
//!
//! 3. **Structural identity.** [`schema_hash`] fingerprints a schema's
//!    shape so separately constructed but identical schemas share cache
//!    entries and form ids.
//!
//! 4. **Typed paths.** Field paths are sequences of [`PathToken`]s;
//!    `a.b[0]` and `["a", "b", 0]` are the same path.
//!
//! ## Crate Policy
//!
//! - No dependencies on other formshape crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod hash;
pub mod path;
pub mod schema;
pub mod walker;

// Re-export primary types for ergonomic imports.
pub use error::{FormshapeError, PathError, SchemaError};
pub use hash::{schema_hash, schema_text, SchemaHash};
pub use path::{check_path, child, join_path, split_path, traverse_path, Hop, PathData, PathToken};
pub use schema::{ArrayNode, Bounds, NodeKind, ObjectNode, PrimitiveType, SchemaNode, StructuralSchema};
pub use walker::{classify, SchemaInfo};
