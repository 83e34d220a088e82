//! Domain layer - Core business logic
//!
//! Contains value objects, entities, state machines and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio_item;
pub mod config;
pub mod error;
pub mod form;
pub mod recording;
pub mod upload;

// Re-export common types
pub use audio_item::{AnswerOption, AnswerOptions, AudioItem, AudioItemRecord, Level};
pub use config::AppConfig;
pub use error::*;
pub use form::{Activity, FormPhase, FormStateMachine};
pub use recording::{Duration, EncodingId, PendingAudioBuffer, RecorderState};
