//! Microphone port interfaces

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::recording::EncodingId;

/// Sample rate requested from the input device
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Interval at which encoded chunks are delivered
pub const CHUNK_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Microphone errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Audio input device is already in use")]
    DeviceBusy,

    #[error("Encoding not supported by this device: {0}")]
    Unsupported(EncodingId),
}

/// Sender half of the chunk channel. Chunks arrive in capture order.
pub type ChunkSender = mpsc::UnboundedSender<Vec<u8>>;

/// Receiver half of the chunk channel
pub type ChunkReceiver = mpsc::UnboundedReceiver<Vec<u8>>;

/// Settings for an exclusive capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub encoding: EncodingId,
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub chunk_interval: StdDuration,
}

impl CaptureRequest {
    /// Speech capture settings for the given encoding
    pub fn speech(encoding: EncodingId) -> Self {
        Self {
            encoding,
            sample_rate: CAPTURE_SAMPLE_RATE,
            echo_cancellation: true,
            noise_suppression: true,
            chunk_interval: CHUNK_INTERVAL,
        }
    }
}

/// Reports which encodings the platform can produce
pub trait EncodingSupport {
    fn supports(&self, encoding: EncodingId) -> bool;
}

/// An open hardware input session.
///
/// Dropping the handle must also release the device.
#[async_trait]
pub trait InputHandle: Send {
    /// Flush any buffered chunk, release the device and close the chunk channel.
    async fn close(self: Box<Self>) -> Result<(), CaptureError>;
}

/// Port for exclusive microphone access
#[async_trait]
pub trait Microphone: EncodingSupport + Send + Sync {
    /// Acquire the input device and start delivering encoded chunks.
    ///
    /// # Arguments
    /// * `request` - Capture settings, including the negotiated encoding
    /// * `chunks` - Channel receiving encoded chunks until the handle closes
    ///
    /// # Returns
    /// A handle owning the device, or a permission/device error
    async fn open(
        &self,
        request: CaptureRequest,
        chunks: ChunkSender,
    ) -> Result<Box<dyn InputHandle>, CaptureError>;
}
