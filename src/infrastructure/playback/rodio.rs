//! Rodio-based preview player
//!
//! Decodes the preview file and plays it on the default output device.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tracing::debug;

use crate::application::ports::{AudioPlayer, PlaybackError};

/// Preview player using rodio
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play_file(&self, path: &Path) -> Result<(), PlaybackError> {
        let path = path.to_path_buf();
        // Run audio playback in blocking thread to avoid blocking the async runtime
        tokio::task::spawn_blocking(move || play_file_sync(path))
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Decode before touching the device so a bad file never opens a stream
fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path)
        .map_err(|e| PlaybackError::Decode(format!("{}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode(e.to_string()))
}

fn play_file_sync(path: PathBuf) -> Result<(), PlaybackError> {
    let source = open_source(&path)?;

    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;

    debug!(path = %path.display(), "playing preview");
    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn garbage_file_fails_to_decode() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"definitely not audio").unwrap();

        assert!(matches!(
            open_source(file.path()),
            Err(PlaybackError::Decode(_))
        ));
    }

    #[test]
    fn missing_file_fails_to_decode() {
        assert!(matches!(
            open_source(Path::new("/nonexistent/preview.wav")),
            Err(PlaybackError::Decode(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn plays_a_short_wav() {
        use crate::domain::recording::{Duration, EncodingId, PendingAudioBuffer};
        use crate::infrastructure::recording::wav::{pcm_bytes, streaming_header};

        let chunks = vec![streaming_header(16_000), pcm_bytes(&[0i16; 1600])];
        let buffer =
            PendingAudioBuffer::from_chunks(chunks, EncodingId::Wav, Duration::from_millis(100));
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(buffer.data()).unwrap();

        assert!(RodioPlayer::new().play_file(file.path()).await.is_ok());
    }
}
