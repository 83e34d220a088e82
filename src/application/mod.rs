//! Application layer - Use cases and port interfaces
//!
//! Contains the capture and upload workflow and the trait definitions
//! for external system interactions.

pub mod audio_form;
pub mod capability;
pub mod ports;
pub mod preview;
pub mod recorder;
pub mod uploader;

// Re-export use cases
pub use audio_form::{AudioFormController, FormError, FormSnapshot, PendingSummary, SaveOutcome};
pub use capability::negotiate_encoding;
pub use preview::{PreviewError, PreviewHandle, PreviewManager};
pub use recorder::{Recorder, RecorderError};
pub use uploader::{
    LocalFile, UploadContext, UploadError, UploadResult, UploadSource, Uploader,
};
