//! Error handling for the apispec generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Generation is all-or-nothing:
//! every variant aborts the run that raised it.
//!
//! # Examples
//!
//! ```
//! use apispec_core::error::{Error, Result};
//!
//! fn might_fail(method: &str) -> Result<()> {
//!     if method.is_empty() {
//!         return Err(Error::UnknownHttpMethod(method.to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(might_fail("").is_err());
//! ```

use thiserror::Error;

/// Result type for apispec generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apispec generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// A descriptor declares a type outside the recognized set
    #[error("Invalid type '{type_name}' for '{path}'")]
    InvalidType { path: String, type_name: String },

    /// Two field paths imply incompatible tree structure
    #[error("Conflicting field structure at path '{path}'")]
    PathConflict { path: String },

    /// A captured request has no URL template to recover its path from
    #[error("Missing URL template for operation '{operation_id}'")]
    MissingTemplate { operation_id: String },

    /// Unrecognized HTTP method
    #[error("Unknown HTTP method '{0}'")]
    UnknownHttpMethod(String),

    /// Unrecognized OAuth2 flow name
    #[error("Unknown OAuth2 flow '{0}'")]
    UnknownOauth2Flow(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// OpenAPI document error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new invalid type error
    pub fn invalid_type(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::InvalidType {
            path: path.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a new path conflict error
    pub fn path_conflict(path: impl Into<String>) -> Self {
        Self::PathConflict { path: path.into() }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}
