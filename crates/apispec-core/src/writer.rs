//! Serialization entry points.

// Internal imports (std, crate)
use crate::jsonschema;
use crate::model::{FieldDescriptor, ResourceModel};
use crate::openapi::{self, ApiMetadata};
use crate::Result;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Output format of generated documents
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Serialize any document in the given format.
pub fn serialize<T: Serialize>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}

/// Assemble an OpenAPI document and serialize it.
pub fn generate_and_serialize(
    resources: &[ResourceModel],
    metadata: &ApiMetadata,
    format: Format,
) -> Result<String> {
    serialize(&openapi::generate(resources, metadata)?, format)
}

/// Build a JSON Schema for a body and serialize it.
pub fn generate_schema(fields: &[FieldDescriptor], title: Option<&str>, format: Format) -> Result<String> {
    serialize(&jsonschema::generate(fields, title)?, format)
}
