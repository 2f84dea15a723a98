//! Loading of captured resource snapshots.
//!
//! Documentation test runs write one `resource.json` per documented example,
//! each in its own directory below a common snippets root. Parallel test
//! runners may write them concurrently; by the time generation starts the set
//! is complete and only read here.

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

use crate::model::ResourceModel;
use crate::Error;

// External imports (alphabetized)
use futures::future::try_join_all;
use log::{debug, info};
use tokio::fs;
use walkdir::WalkDir;

/// Snapshot file name inside each snippet directory
pub const SNAPSHOT_FILE_NAME: &str = "resource.json";

/// An ordered, immutable set of resource snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    resources: Vec<ResourceModel>,
}

impl SnapshotSet {
    pub fn new(resources: Vec<ResourceModel>) -> Self {
        Self { resources }
    }

    /// Load every snapshot below `dir`, ordered by file path.
    pub async fn from_dir<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "Snippets directory {} does not exist",
                dir.display()
            )));
        }

        let files = Self::discover(dir)?;
        debug!("Found {} snapshot files below {}", files.len(), dir.display());
        let resources = try_join_all(files.iter().map(Self::read_resource)).await?;
        info!("Loaded {} resource snapshots", resources.len());
        Ok(Self { resources })
    }

    fn discover(dir: &Path) -> crate::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name() == SNAPSHOT_FILE_NAME {
                files.push(entry.into_path());
            } else {
                debug!("Skipping {}", entry.path().display());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load a single snapshot file.
    pub async fn read_resource<P: AsRef<Path>>(path: P) -> crate::Result<ResourceModel> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("Failed to parse snapshot {}: {}", path.display(), e))
        })
    }

    pub fn resources(&self) -> &[ResourceModel] {
        &self.resources
    }

    /// Resources not marked private.
    pub fn public_resources(&self) -> Vec<ResourceModel> {
        self.resources
            .iter()
            .filter(|r| !r.private_resource)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
