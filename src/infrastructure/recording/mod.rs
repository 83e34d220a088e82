//! Recording infrastructure module
//!
//! Cross-platform microphone capture using cpal. Speech is resampled to
//! 16kHz mono and delivered as FLAC or streamed WAV chunks.

mod cpal_microphone;
mod flac_encoder;
mod resampler;
pub(crate) mod wav;

pub use cpal_microphone::CpalMicrophone;
pub use flac_encoder::{FlacError, SpeechFlacEncoder};
