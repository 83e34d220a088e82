//! Local directory object store
//!
//! Keeps uploads on disk for offline curation and for driving the form
//! without a Firebase project.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{ObjectMetadata, ObjectStore, StorageError};

/// Object store writing under a root directory, returning `file://` URLs
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path below the root, refusing anything that escapes it
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::WriteFailed(format!(
                "Invalid object path: {}",
                path
            )));
        }

        let root = if self.root.is_absolute() {
            self.root.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?
                .join(&self.root)
        };
        Ok(root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalDiskStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        }

        fs::write(&target, &bytes)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        debug!(
            path = %target.display(),
            content_type = %metadata.content_type,
            origin = metadata.origin.as_str(),
            "object written"
        );

        Url::from_file_path(&target)
            .map(String::from)
            .map_err(|_| StorageError::WriteFailed(format!("Not a file path: {}", target.display())))
    }
}
