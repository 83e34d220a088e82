//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod document_store;
pub mod microphone;
pub mod object_store;
pub mod player;

// Re-export common types
pub use config::ConfigStore;
pub use document_store::{DocumentStore, PersistenceError};
pub use microphone::{
    CaptureError, CaptureRequest, ChunkReceiver, ChunkSender, EncodingSupport, InputHandle,
    Microphone, CAPTURE_SAMPLE_RATE, CHUNK_INTERVAL,
};
pub use object_store::{AudioOrigin, ObjectMetadata, ObjectStore, StorageError};
pub use player::{AudioPlayer, PlaybackError};
