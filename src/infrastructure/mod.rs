//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, rodio, Firebase, etc.

pub mod config;
pub mod persistence;
pub mod playback;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use config::XdgConfigStore;
pub use persistence::FirestoreDocumentStore;
pub use playback::RodioPlayer;
pub use recording::CpalMicrophone;
pub use storage::{FirebaseStorage, LocalDiskStore};
