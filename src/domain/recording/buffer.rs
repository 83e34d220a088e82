//! Finalized recording buffer

use super::duration::Duration;
use super::encoding::EncodingId;

/// Value object holding a stopped recording: the concatenated chunks,
/// tagged with the encoding they were produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAudioBuffer {
    data: Vec<u8>,
    encoding: EncodingId,
    chunk_count: usize,
    duration: Duration,
}

impl PendingAudioBuffer {
    /// Concatenate chunks, in order, into one buffer
    pub fn from_chunks(chunks: Vec<Vec<u8>>, encoding: EncodingId, duration: Duration) -> Self {
        let chunk_count = chunks.len();
        let mut data = chunks.concat();
        if encoding == EncodingId::Wav {
            seal_streamed_wav(&mut data);
        }
        Self {
            data,
            encoding,
            chunk_count,
            duration,
        }
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encoding(&self) -> EncodingId {
        self.encoding
    }

    /// Number of chunks the buffer was finalized from
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Recorded duration as counted by the elapsed timer
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        human_readable_size(self.size_bytes())
    }
}

/// Streamed WAV headers carry placeholder sizes. Once the total length is
/// known, rewrite the RIFF and data chunk sizes in place.
fn seal_streamed_wav(data: &mut [u8]) {
    const HEADER_LEN: usize = 44;
    if data.len() < HEADER_LEN || &data[0..4] != b"RIFF" || &data[36..40] != b"data" {
        return;
    }
    let riff_len = u32::try_from(data.len() - 8).unwrap_or(u32::MAX);
    let data_len = u32::try_from(data.len() - HEADER_LEN).unwrap_or(u32::MAX);
    data[4..8].copy_from_slice(&riff_len.to_le_bytes());
    data[40..44].copy_from_slice(&data_len.to_le_bytes());
}

/// Format a byte count as B / KB / MB
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
