//! OpenAPI 3 document model and assembly.
//!
//! [`generate`] folds a set of resource snapshots into an [`OpenApi`]
//! document: paths and operations, parameters, bodies with examples,
//! responses, security requirements and hoisted component schemas.

pub mod components;
pub mod generator;
pub mod parameters;
pub mod security;
pub mod status;
pub mod types;

pub use generator::{generate, validate, ApiMetadata};
pub use types::{
    Components, Info, OpenApi, Operation, Parameter, PathItem, Server, SecurityScheme, Tag,
    OPENAPI_VERSION,
};
