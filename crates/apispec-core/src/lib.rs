//! apispec Core Library
//!
//! This library turns resource snapshots captured during documentation test
//! runs into JSON Schema and OpenAPI 3 documents.

pub mod canonical;
pub mod config;
pub mod constraints;
pub mod error;
pub mod jsonschema;
pub mod model;
pub mod openapi;
pub mod schema;
pub mod snapshot;
pub mod writer;

pub use crate::{
    config::{Config, Oauth2Configuration},
    error::{Error, Result},
    model::{FieldDescriptor, ResourceModel},
    openapi::{ApiMetadata, OpenApi},
    schema::Schema,
    snapshot::SnapshotSet,
    writer::{generate_and_serialize, generate_schema, Format},
};
