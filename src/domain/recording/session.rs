//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Requesting,
    Recording,
    Stopping,
    Finalized,
    Failed,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        }
    }

    /// Whether a hardware input handle may be held in this state
    pub const fn holds_device(&self) -> bool {
        matches!(self, Self::Requesting | Self::Recording | Self::Stopping)
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: String,
}

/// Transition table for a single recording session.
///
/// State machine:
///   IDLE -> REQUESTING (begin_request)
///   REQUESTING -> RECORDING (grant)
///   RECORDING -> STOPPING (begin_stop)
///   STOPPING -> FINALIZED (finalize)
///   REQUESTING | RECORDING | STOPPING -> FAILED (fail)
///   FINALIZED -> IDLE (release)
///   any -> IDLE (reset)
#[derive(Debug, Default)]
pub struct RecordingStateMachine {
    state: RecorderState,
}

impl RecordingStateMachine {
    /// Create a new state machine in idle state
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RecorderState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    fn transition(
        &mut self,
        allowed: &[RecorderState],
        next: RecorderState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if !allowed.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Transition from IDLE to REQUESTING
    pub fn begin_request(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecorderState::Idle],
            RecorderState::Requesting,
            "start recording",
        )
    }

    /// Transition from REQUESTING to RECORDING once the device is granted
    pub fn grant(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecorderState::Requesting],
            RecorderState::Recording,
            "begin capture",
        )
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecorderState::Recording],
            RecorderState::Stopping,
            "stop recording",
        )
    }

    /// Transition from STOPPING to FINALIZED
    pub fn finalize(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecorderState::Stopping],
            RecorderState::Finalized,
            "finalize recording",
        )
    }

    /// Transition from any active state to FAILED
    pub fn fail(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[
                RecorderState::Requesting,
                RecorderState::Recording,
                RecorderState::Stopping,
            ],
            RecorderState::Failed,
            "fail recording",
        )
    }

    /// Transition from FINALIZED to IDLE once the buffer is handed over
    pub fn release(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecorderState::Finalized],
            RecorderState::Idle,
            "release buffer",
        )
    }

    /// Return to IDLE from any state
    pub fn reset(&mut self) {
        self.state = RecorderState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine_is_idle() {
        let machine = RecordingStateMachine::new();
        assert!(machine.is_idle());
        assert!(!machine.state().holds_device());
    }

    #[test]
    fn happy_path() {
        let mut machine = RecordingStateMachine::new();
        machine.begin_request().unwrap();
        assert_eq!(machine.state(), RecorderState::Requesting);
        machine.grant().unwrap();
        assert!(machine.is_recording());
        machine.begin_stop().unwrap();
        assert_eq!(machine.state(), RecorderState::Stopping);
        machine.finalize().unwrap();
        assert_eq!(machine.state(), RecorderState::Finalized);
        machine.release().unwrap();
        assert!(machine.is_idle());
    }

    #[test]
    fn start_while_requesting_or_recording_fails() {
        let mut machine = RecordingStateMachine::new();
        machine.begin_request().unwrap();
        let err = machine.begin_request().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Requesting);

        machine.grant().unwrap();
        let err = machine.begin_request().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn stop_from_idle_fails() {
        let mut machine = RecordingStateMachine::new();
        let err = machine.begin_stop().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Idle);
    }

    #[test]
    fn failed_requires_reset_before_retry() {
        let mut machine = RecordingStateMachine::new();
        machine.begin_request().unwrap();
        machine.fail().unwrap();
        assert_eq!(machine.state(), RecorderState::Failed);
        assert!(machine.begin_request().is_err());

        machine.reset();
        assert!(machine.begin_request().is_ok());
    }

    #[test]
    fn fail_from_idle_is_rejected() {
        let mut machine = RecordingStateMachine::new();
        assert!(machine.fail().is_err());
    }

    #[test]
    fn device_held_only_while_active() {
        assert!(RecorderState::Requesting.holds_device());
        assert!(RecorderState::Recording.holds_device());
        assert!(RecorderState::Stopping.holds_device());
        assert!(!RecorderState::Finalized.holds_device());
        assert!(!RecorderState::Failed.holds_device());
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecorderState::Recording,
            action: "start recording".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start recording"));
        assert!(msg.contains("recording state"));
    }
}
