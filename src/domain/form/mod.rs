//! Audio item form state machine

use std::fmt;
use thiserror::Error;

/// Form lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormPhase {
    #[default]
    Clean,
    Editing,
    Validating,
    Saving,
    Done,
}

impl FormPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Editing => "editing",
            Self::Validating => "validating",
            Self::Saving => "saving",
            Self::Done => "done",
        }
    }

    /// Whether fields may still change
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Clean | Self::Editing)
    }
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capture activity running alongside editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activity {
    #[default]
    Idle,
    Recording,
    Uploading,
}

impl Activity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Uploading => "uploading",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when a form action is not allowed in the current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} while the form is {phase} (activity: {activity})")]
pub struct FormTransitionError {
    pub phase: FormPhase,
    pub activity: Activity,
    pub action: String,
}

/// Composite form state.
///
/// State machine:
///   CLEAN | EDITING -> EDITING (edit)
///   CLEAN | EDITING + IDLE -> EDITING (edit_audio)
///   CLEAN | EDITING + IDLE -> RECORDING / UPLOADING (begin_activity)
///   RECORDING / UPLOADING -> IDLE, phase EDITING (finish_activity)
///   CLEAN | EDITING + IDLE -> VALIDATING (begin_validation)
///   VALIDATING -> EDITING (end_validation)
///   VALIDATING -> SAVING (begin_saving)
///   SAVING -> EDITING (save_failed)
///   SAVING -> DONE (save_succeeded)
#[derive(Debug, Default)]
pub struct FormStateMachine {
    phase: FormPhase,
    activity: Activity,
}

impl FormStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    fn reject(&self, action: &str) -> FormTransitionError {
        FormTransitionError {
            phase: self.phase,
            activity: self.activity,
            action: action.to_string(),
        }
    }

    /// Record a field edit
    pub fn edit(&mut self) -> Result<(), FormTransitionError> {
        if !self.phase.is_editable() {
            return Err(self.reject("edit fields"));
        }
        self.phase = FormPhase::Editing;
        Ok(())
    }

    /// Record an edit of the audio source, which only an idle form accepts
    pub fn edit_audio(&mut self) -> Result<(), FormTransitionError> {
        if self.activity != Activity::Idle {
            return Err(self.reject("change the audio"));
        }
        self.edit()
    }

    /// Enter a recording or uploading sub-state
    pub fn begin_activity(&mut self, activity: Activity) -> Result<(), FormTransitionError> {
        if activity == Activity::Idle {
            return Err(self.reject("begin an idle activity"));
        }
        if !self.phase.is_editable() || self.activity != Activity::Idle {
            return Err(self.reject(&format!("start {}", activity)));
        }
        self.phase = FormPhase::Editing;
        self.activity = activity;
        Ok(())
    }

    /// Leave `activity` and return to editing.
    ///
    /// A no-op when a different activity is current.
    pub fn finish_activity(&mut self, activity: Activity) {
        if self.activity != activity {
            return;
        }
        self.activity = Activity::Idle;
        if self.phase.is_editable() {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn begin_validation(&mut self) -> Result<(), FormTransitionError> {
        if !self.phase.is_editable() || self.activity != Activity::Idle {
            return Err(self.reject("validate"));
        }
        self.phase = FormPhase::Validating;
        Ok(())
    }

    /// Return to editing after a validation pass that does not lead to a save
    pub fn end_validation(&mut self) {
        if self.phase == FormPhase::Validating {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn begin_saving(&mut self) -> Result<(), FormTransitionError> {
        if self.phase != FormPhase::Validating {
            return Err(self.reject("save"));
        }
        self.phase = FormPhase::Saving;
        Ok(())
    }

    pub fn save_failed(&mut self) {
        if self.phase == FormPhase::Saving {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn save_succeeded(&mut self) -> Result<(), FormTransitionError> {
        if self.phase != FormPhase::Saving {
            return Err(self.reject("complete save"));
        }
        self.phase = FormPhase::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_is_clean_and_idle() {
        let form = FormStateMachine::new();
        assert_eq!(form.phase(), FormPhase::Clean);
        assert_eq!(form.activity(), Activity::Idle);
    }

    #[test]
    fn edit_moves_to_editing() {
        let mut form = FormStateMachine::new();
        form.edit().unwrap();
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn activities_are_exclusive() {
        let mut form = FormStateMachine::new();
        form.begin_activity(Activity::Uploading).unwrap();
        let err = form.begin_activity(Activity::Uploading).unwrap_err();
        assert_eq!(err.activity, Activity::Uploading);
        assert!(form.begin_activity(Activity::Recording).is_err());

        form.finish_activity(Activity::Uploading);
        assert_eq!(form.activity(), Activity::Idle);
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn finishing_another_activity_keeps_the_current_one() {
        let mut form = FormStateMachine::new();
        form.begin_activity(Activity::Uploading).unwrap();

        form.finish_activity(Activity::Recording);
        assert_eq!(form.activity(), Activity::Uploading);
        assert!(form.begin_activity(Activity::Uploading).is_err());
    }

    #[test]
    fn audio_edits_wait_for_idle() {
        let mut form = FormStateMachine::new();
        form.begin_activity(Activity::Uploading).unwrap();
        assert!(form.edit_audio().is_err());
        assert!(form.edit().is_ok());

        form.finish_activity(Activity::Uploading);
        assert!(form.edit_audio().is_ok());
    }

    #[test]
    fn validation_blocked_during_activity() {
        let mut form = FormStateMachine::new();
        form.begin_activity(Activity::Recording).unwrap();
        assert!(form.begin_validation().is_err());
        form.finish_activity(Activity::Recording);
        assert!(form.begin_validation().is_ok());
    }

    #[test]
    fn save_cycle() {
        let mut form = FormStateMachine::new();
        form.begin_validation().unwrap();
        form.begin_saving().unwrap();
        form.save_failed();
        assert_eq!(form.phase(), FormPhase::Editing);

        form.begin_validation().unwrap();
        form.begin_saving().unwrap();
        form.save_succeeded().unwrap();
        assert_eq!(form.phase(), FormPhase::Done);
        assert!(form.edit().is_err());
        assert!(form.begin_activity(Activity::Recording).is_err());
    }

    #[test]
    fn saving_requires_validation_first() {
        let mut form = FormStateMachine::new();
        assert!(form.begin_saving().is_err());
    }

    #[test]
    fn failed_validation_returns_to_editing() {
        let mut form = FormStateMachine::new();
        form.begin_validation().unwrap();
        form.end_validation();
        assert_eq!(form.phase(), FormPhase::Editing);
    }
}
