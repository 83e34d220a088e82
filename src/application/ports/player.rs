//! Preview playback port
//!
//! Lets the operator listen to a pending recording before it is uploaded.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during preview playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The file could not be decoded
    #[error("Cannot decode preview: {0}")]
    Decode(String),

    /// Failed to play the preview
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// No audio output device available
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),
}

/// Port trait for playing a local audio file to completion
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play_file(&self, path: &Path) -> Result<(), PlaybackError>;
}
