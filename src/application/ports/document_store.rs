//! Document store port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio_item::{AudioItemRecord, StoredAudioItem};

/// Document store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Document store request failed: {0}")]
    RequestFailed(String),

    #[error("Permission denied by document store: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document store error: {0}")]
    ApiError(String),

    #[error("Failed to parse document store response: {0}")]
    ParseError(String),
}

/// Port for persisting audio item records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a new document and return its id
    async fn create(
        &self,
        collection: &str,
        record: &AudioItemRecord,
    ) -> Result<String, PersistenceError>;

    /// Replace the fields of an existing document
    async fn update(
        &self,
        collection: &str,
        id: &str,
        record: &AudioItemRecord,
    ) -> Result<(), PersistenceError>;

    /// Fetch one document, `None` if it does not exist
    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredAudioItem>, PersistenceError>;
}
