//! Configuration management for API specification generation.
//!
//! This module defines the `Config` struct that controls where snapshots are
//! read from, where documents are written to, and the document-level metadata
//! (title, version, servers, tags, OAuth2 settings). The configuration can be
//! loaded from a YAML or TOML file, created programmatically, or overridden
//! from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use apispec_core::config::Config;
//!
//! # async fn example() -> apispec_core::Result<()> {
//! // Create a config programmatically
//! let mut config = Config::default();
//! config.title = "Orders API".to_string();
//!
//! // Or load it from a file
//! let config = Config::from_file("apispec.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

use crate::openapi::{ApiMetadata, Server};
use crate::writer::Format;
use crate::Error;

// External imports (alphabetized)
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;
use url::Url;

/// Configuration for a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the captured `resource.json` snapshots
    #[serde(default = "default_snippets_dir")]
    pub snippets_dir: PathBuf,

    /// Directory generated documents are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the document, without extension
    #[serde(default = "default_output_file_name_prefix")]
    pub output_file_name_prefix: String,

    #[serde(default)]
    pub format: Format,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_version")]
    pub version: String,

    /// A single URL or a list of server objects
    #[serde(default, deserialize_with = "deserialize_servers")]
    pub servers: Vec<Server>,

    /// Tag name to description
    #[serde(default)]
    pub tag_descriptions: IndexMap<String, String>,

    /// YAML file with additional tag descriptions
    #[serde(default)]
    pub tag_descriptions_file: Option<PathBuf>,

    #[serde(default)]
    pub oauth2: Option<Oauth2Configuration>,

    /// Also write a document without private resources
    #[serde(default)]
    pub separate_public_api: bool,
}

/// OAuth2 settings used to emit `oauth2_<flow>` security schemes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oauth2Configuration {
    #[serde(default)]
    pub token_url: String,
    #[serde(default)]
    pub authorization_url: String,
    /// Any of authorizationCode, clientCredentials, password, implicit
    #[serde(default)]
    pub flows: Vec<String>,
    /// Scope name to description
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snippets_dir: default_snippets_dir(),
            output_dir: default_output_dir(),
            output_file_name_prefix: default_output_file_name_prefix(),
            format: Format::default(),
            title: default_title(),
            description: None,
            version: default_version(),
            servers: Vec::new(),
            tag_descriptions: IndexMap::new(),
            tag_descriptions_file: None,
            oauth2: None,
            separate_public_api: false,
        }
    }
}

impl Config {
    /// Load configuration from a file, TOML if the extension is `.toml`,
    /// YAML otherwise
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file as YAML
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Path of the generated document
    pub fn output_path(&self, public: bool) -> PathBuf {
        let suffix = if public { "-public" } else { "" };
        self.output_dir.join(format!(
            "{}{}.{}",
            self.output_file_name_prefix,
            suffix,
            self.format.extension()
        ))
    }

    /// Document metadata with servers validated and tag files merged
    pub async fn metadata(&self) -> crate::Result<ApiMetadata> {
        for server in &self.servers {
            validate_server_url(&server.url)?;
        }

        let mut tag_descriptions = match &self.tag_descriptions_file {
            Some(path) => {
                let content = fs::read_to_string(path).await?;
                serde_yaml::from_str::<IndexMap<String, String>>(&content)?
            }
            None => IndexMap::new(),
        };
        tag_descriptions.extend(self.tag_descriptions.clone());

        Ok(ApiMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            servers: self.servers.clone(),
            tag_descriptions,
            oauth2: self.oauth2.clone(),
        })
    }
}

// Relative server URLs are allowed by OpenAPI.
fn validate_server_url(url: &str) -> crate::Result<()> {
    if url.starts_with('/') {
        return Ok(());
    }
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| Error::config(format!("Invalid server URL '{}': {}", url, e)))
}

fn deserialize_servers<'de, D>(deserializer: D) -> Result<Vec<Server>, D::Error>
where
    D: Deserializer<'de>,
{
    // Either a single URL string or a sequence of URLs / server objects
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(url) => Ok(vec![Server::new(url)]),
        SerdeValue::Seq(items) => items
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(url) => Ok(Server::new(url)),
                other @ SerdeValue::Map(_) => other
                    .deserialize_into::<Server>()
                    .map_err(serde::de::Error::custom),
                _ => Err(serde::de::Error::custom(
                    "Expected server URL or server object",
                )),
            })
            .collect(),
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        _ => Err(serde::de::Error::custom(
            "Expected string or array of servers",
        )),
    }
}

fn default_snippets_dir() -> PathBuf {
    PathBuf::from("build/generated-snippets")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/api-spec")
}

fn default_output_file_name_prefix() -> String {
    "openapi3".to_string()
}

fn default_title() -> String {
    "API".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}
