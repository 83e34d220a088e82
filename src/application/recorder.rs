//! Recorder use case
//!
//! Owns one hardware input session at a time and turns the chunks it
//! delivers into a [`PendingAudioBuffer`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::recording::{
    Duration, EncodingId, InvalidStateTransition, PendingAudioBuffer, RecorderState,
    RecordingStateMachine,
};

use super::capability::negotiate_encoding;
use super::ports::{CaptureError, CaptureRequest, ChunkReceiver, InputHandle, Microphone};

/// Errors from the recorder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Microphone access was denied. Allow access and try again")]
    PermissionDenied,

    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Recording produced no audio")]
    EmptyRecording,

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Recording was cancelled")]
    Cancelled,
}

impl From<CaptureError> for RecorderError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::DeviceError(msg) => Self::DeviceError(msg),
            other => Self::DeviceError(other.to_string()),
        }
    }
}

/// Aborts the elapsed-time ticker when dropped
struct TimerGuard(JoinHandle<()>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Mutable state of the current session
#[derive(Default)]
struct RecordingSession {
    machine: RecordingStateMachine,
    /// Bumped on every discard so an in-flight `start` can tell it was cancelled
    generation: u64,
    handle: Option<Box<dyn InputHandle>>,
    chunks: Option<ChunkReceiver>,
    timer: Option<TimerGuard>,
    buffer: Option<PendingAudioBuffer>,
}

impl RecordingSession {
    /// Drop every resource tied to the current attempt
    fn clear(&mut self) -> Option<Box<dyn InputHandle>> {
        self.timer = None;
        self.chunks = None;
        self.buffer = None;
        self.handle.take()
    }
}

/// Recorder driving a [`Microphone`] through the recording state machine
pub struct Recorder<M: Microphone> {
    microphone: M,
    encoding: EncodingId,
    session: Mutex<RecordingSession>,
    elapsed_secs: Arc<AtomicU64>,
}

impl<M: Microphone> Recorder<M> {
    /// Create a recorder, negotiating the encoding once up front
    pub fn new(microphone: M) -> Self {
        let encoding = negotiate_encoding(&microphone);
        debug!(%encoding, "negotiated capture encoding");
        Self {
            microphone,
            encoding,
            session: Mutex::new(RecordingSession::default()),
            elapsed_secs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current recorder state
    pub fn state(&self) -> RecorderState {
        self.session.lock().machine.state()
    }

    /// Encoding every buffer from this recorder is tagged with
    pub fn encoding(&self) -> EncodingId {
        self.encoding
    }

    /// Whole seconds elapsed in the current session
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.elapsed_secs.load(Ordering::SeqCst))
    }

    /// Acquire the microphone and start capturing.
    ///
    /// Valid only from `Idle`.
    pub async fn start(&self) -> Result<(), RecorderError> {
        let generation = {
            let mut session = self.session.lock();
            session.machine.begin_request()?;
            session.generation
        };
        self.elapsed_secs.store(0, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        let request = CaptureRequest::speech(self.encoding);
        let opened = self.microphone.open(request, tx).await;

        let cancelled = {
            let mut session = self.session.lock();
            let still_requesting = session.generation == generation
                && session.machine.state() == RecorderState::Requesting;
            match opened {
                Ok(handle) if still_requesting => {
                    session.machine.grant()?;
                    session.handle = Some(handle);
                    session.chunks = Some(rx);
                    session.timer = Some(self.spawn_ticker());
                    None
                }
                Ok(handle) => Some(handle),
                Err(err) => {
                    if still_requesting {
                        session.machine.fail()?;
                    }
                    warn!(error = %err, "microphone request failed");
                    return Err(err.into());
                }
            }
        };

        if let Some(handle) = cancelled {
            debug!("recording discarded while requesting the microphone");
            if let Err(err) = handle.close().await {
                warn!(error = %err, "failed to release cancelled input");
            }
            return Err(RecorderError::Cancelled);
        }

        info!(encoding = %self.encoding, "recording started");
        Ok(())
    }

    /// Stop capturing and finalize the chunks into a buffer.
    ///
    /// Valid only from `Recording`. Zero captured bytes is a failure.
    pub async fn stop(&self) -> Result<(), RecorderError> {
        let (handle, receiver) = {
            let mut session = self.session.lock();
            session.machine.begin_stop()?;
            session.timer = None;
            (session.handle.take(), session.chunks.take())
        };

        if let Some(handle) = handle {
            if let Err(err) = handle.close().await {
                warn!(error = %err, "input device failed to close cleanly");
                let mut session = self.session.lock();
                session.machine.fail()?;
                return Err(err.into());
            }
        }

        let chunks = match receiver {
            Some(receiver) => drain(receiver).await,
            None => Vec::new(),
        };
        let duration = self.elapsed();

        let mut session = self.session.lock();
        if session.machine.state() != RecorderState::Stopping {
            // discarded while the device was closing
            return Err(RecorderError::Cancelled);
        }

        if chunks.iter().all(Vec::is_empty) {
            session.machine.fail()?;
            warn!(chunks = chunks.len(), "recording produced no audio");
            return Err(RecorderError::EmptyRecording);
        }

        let buffer = PendingAudioBuffer::from_chunks(chunks, self.encoding, duration);
        info!(
            chunks = buffer.chunk_count(),
            size = %buffer.human_readable_size(),
            duration = %duration.as_clock(),
            "recording finalized"
        );
        session.machine.finalize()?;
        session.buffer = Some(buffer);
        Ok(())
    }

    /// Hand over the finalized buffer and return to `Idle`
    pub fn take_buffer(&self) -> Result<PendingAudioBuffer, RecorderError> {
        let mut session = self.session.lock();
        session.machine.release()?;
        session.buffer.take().ok_or(RecorderError::EmptyRecording)
    }

    /// Abandon the current session from any state and return to `Idle`.
    ///
    /// Releases the device if it is held. A no-op when already idle.
    pub async fn discard(&self) {
        let handle = {
            let mut session = self.session.lock();
            if session.machine.is_idle() {
                return;
            }
            debug!(state = %session.machine.state(), "discarding recording");
            session.generation = session.generation.wrapping_add(1);
            session.machine.reset();
            session.clear()
        };
        self.elapsed_secs.store(0, Ordering::SeqCst);

        if let Some(handle) = handle {
            if let Err(err) = handle.close().await {
                warn!(error = %err, "failed to release input device");
            }
        }
    }

    fn spawn_ticker(&self) -> TimerGuard {
        let elapsed = Arc::clone(&self.elapsed_secs);
        TimerGuard(tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let secs = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(secs, "recording tick");
            }
        }))
    }
}

/// Collect every chunk still queued, in arrival order
async fn drain(mut receiver: ChunkReceiver) -> Vec<Vec<u8>> {
    receiver.close();
    let mut chunks = Vec::new();
    while let Some(chunk) = receiver.recv().await {
        debug!(len = chunk.len(), "chunk received");
        chunks.push(chunk);
    }
    chunks
}
