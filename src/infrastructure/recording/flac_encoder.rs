//! FLAC encoding of captured speech
//!
//! FLAC keeps recordings lossless at roughly half the size of WAV, which
//! leaves more room under the upload ceiling. Input is mono 16-bit PCM.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::{Verified, Verify};
use flacenc::source::MemSource;

const BITS_PER_SAMPLE: usize = 16;
const CHANNELS: usize = 1;

#[derive(Debug, thiserror::Error)]
pub enum FlacError {
    #[error("FLAC encoder rejected its configuration: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),
}

/// Encoder with a verified configuration, built once per capture
pub struct SpeechFlacEncoder {
    config: Verified<config::Encoder>,
    sample_rate: u32,
}

impl SpeechFlacEncoder {
    pub fn new(sample_rate: u32) -> Result<Self, FlacError> {
        let config = config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| FlacError::Config(format!("{:?}", e)))?;
        Ok(Self {
            config,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Encode the whole recording into one FLAC stream
    pub fn encode(&self, pcm: &[i16]) -> Result<Vec<u8>, FlacError> {
        let widened: Vec<i32> = pcm.iter().copied().map(i32::from).collect();
        let source = MemSource::from_samples(
            &widened,
            CHANNELS,
            BITS_PER_SAMPLE,
            self.sample_rate as usize,
        );

        let stream =
            flacenc::encode_with_fixed_block_size(&self.config, source, self.config.block_size)
                .map_err(|e| FlacError::Encode(format!("{:?}", e)))?;

        let mut sink = ByteSink::new();
        stream
            .write(&mut sink)
            .map_err(|e| FlacError::Encode(e.to_string()))?;
        Ok(sink.into_inner())
    }
}
