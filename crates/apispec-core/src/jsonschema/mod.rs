//! JSON Schema generation from field descriptors.
//!
//! Field descriptors are flat: each names a path into a JSON body. This module
//! merges duplicate descriptors ([`reduce`]), parses their paths ([`path`]) and
//! folds them into a nested [`Schema`](crate::schema::Schema) tree
//! ([`generate`]).

mod generator;
mod leaf;
pub mod path;
pub mod reduce;

pub use generator::generate;
pub use path::{JsonFieldPath, Segment};
pub use reduce::{reduce, MergedField};
