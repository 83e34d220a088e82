//! Uploader use case
//!
//! Pushes a local file or a finalized recording to object storage.
//! Every precondition is checked before the store is contacted, and each
//! call makes exactly one attempt.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::audio_item::Level;
use crate::domain::recording::{human_readable_size, PendingAudioBuffer};
use crate::domain::upload::{
    declared_media_type, is_audio_media_type, ObjectPath, MAX_UPLOAD_BYTES,
};

use super::ports::{AudioOrigin, ObjectMetadata, ObjectStore, StorageError};

/// Errors from the uploader
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(
        "File is too large ({}). The limit is {}",
        display_size(.size),
        display_size(.limit)
    )]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Unsupported media type '{0}'. Choose an audio file")]
    UnsupportedMediaType(String),

    #[error("Nothing to upload: the audio is empty")]
    EmptyPayload,

    #[error("Failed to read audio file: {0}")]
    ReadFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

fn display_size(bytes: &u64) -> String {
    human_readable_size(*bytes)
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        let message = match err {
            StorageError::RequestFailed(msg)
            | StorageError::Rejected(msg)
            | StorageError::ParseError(msg)
            | StorageError::WriteFailed(msg) => msg,
        };
        Self::UploadFailed(message)
    }
}

/// A file chosen by the operator, described by its filesystem metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
    size_bytes: u64,
    media_type: String,
}

impl LocalFile {
    /// Read the size and declared media type of `path` without loading it
    pub async fn inspect(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::ReadFailed(format!("{}: {}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(UploadError::ReadFailed(format!(
                "{} is not a file",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            media_type: declared_media_type(path).to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "audio".to_string())
    }
}

/// What to upload
#[derive(Debug, Clone, Copy)]
pub enum UploadSource<'a> {
    File(&'a LocalFile),
    Recording(&'a PendingAudioBuffer),
}

impl UploadSource<'_> {
    fn size_bytes(&self) -> u64 {
        match self {
            Self::File(file) => file.size_bytes(),
            Self::Recording(buffer) => buffer.size_bytes(),
        }
    }

    fn media_type(&self) -> &str {
        match self {
            Self::File(file) => file.media_type(),
            Self::Recording(buffer) => buffer.encoding().mime_type(),
        }
    }

    fn origin(&self) -> AudioOrigin {
        match self {
            Self::File(_) => AudioOrigin::File,
            Self::Recording(_) => AudioOrigin::Recording,
        }
    }
}

/// Item context the destination is scoped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadContext {
    pub level: Level,
}

/// Successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Durable public URL returned by the store
    pub remote_url: String,
    pub object_path: String,
    pub size_bytes: u64,
}

/// Uploader over an [`ObjectStore`]
pub struct Uploader<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> Uploader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Check that `source` may be uploaded at all
    pub fn check(source: &UploadSource<'_>) -> Result<(), UploadError> {
        let size = source.size_bytes();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::PayloadTooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        if size == 0 {
            return Err(UploadError::EmptyPayload);
        }
        let media_type = source.media_type();
        if !is_audio_media_type(media_type) {
            return Err(UploadError::UnsupportedMediaType(media_type.to_string()));
        }
        Ok(())
    }

    /// Upload `source` under a fresh name scoped by the item's level
    pub async fn upload(
        &self,
        source: UploadSource<'_>,
        context: UploadContext,
    ) -> Result<UploadResult, UploadError> {
        if let Err(err) = Self::check(&source) {
            warn!(error = %err, "upload rejected before transfer");
            return Err(err);
        }

        let (bytes, extension) = match source {
            UploadSource::File(file) => {
                let bytes = tokio::fs::read(file.path())
                    .await
                    .map_err(|e| UploadError::ReadFailed(e.to_string()))?;
                // the file may have grown since it was inspected
                if bytes.len() as u64 > MAX_UPLOAD_BYTES {
                    return Err(UploadError::PayloadTooLarge {
                        size: bytes.len() as u64,
                        limit: MAX_UPLOAD_BYTES,
                    });
                }
                (bytes, file.extension())
            }
            UploadSource::Recording(buffer) => (
                buffer.data().to_vec(),
                buffer.encoding().extension().to_string(),
            ),
        };

        let suffix = Uuid::new_v4().simple().to_string();
        let path = ObjectPath::new(context.level, Utc::now(), &suffix[..8], &extension);
        let metadata = ObjectMetadata {
            content_type: source.media_type().to_string(),
            level: context.level,
            origin: source.origin(),
        };
        let size_bytes = bytes.len() as u64;

        info!(
            path = %path,
            size = %human_readable_size(size_bytes),
            origin = metadata.origin.as_str(),
            "uploading audio"
        );

        let remote_url = self
            .store
            .put_object(path.as_str(), bytes, &metadata)
            .await
            .map_err(|err| {
                warn!(error = %err, path = %path, "upload failed");
                UploadError::from(err)
            })?;

        info!(path = %path, url = %remote_url, "upload complete");
        Ok(UploadResult {
            remote_url,
            object_path: path.to_string(),
            size_bytes,
        })
    }
}
