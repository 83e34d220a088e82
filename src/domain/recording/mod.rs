//! Recording domain module

mod buffer;
mod duration;
mod encoding;
mod session;

pub use buffer::{human_readable_size, PendingAudioBuffer};
pub use duration::{Duration, DEFAULT_MAX_RECORDING_SECS};
pub use encoding::{EncodingId, PREFERRED_ENCODINGS};
pub use session::{InvalidStateTransition, RecorderState, RecordingStateMachine};
