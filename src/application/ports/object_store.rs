//! Object storage port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio_item::Level;

/// Object storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    RequestFailed(String),

    #[error("Storage rejected the upload: {0}")]
    Rejected(String),

    #[error("Failed to parse storage response: {0}")]
    ParseError(String),

    #[error("Failed to write object: {0}")]
    WriteFailed(String),
}

/// Where an uploaded payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOrigin {
    Recording,
    File,
}

impl AudioOrigin {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::File => "file",
        }
    }
}

/// Metadata stored alongside an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub level: Level,
    pub origin: AudioOrigin,
}

/// Port for durable object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at `path`.
    ///
    /// # Returns
    /// A durable, publicly fetchable URL for the object
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<String, StorageError>;
}
