//! Field validation results

use std::fmt;

/// A single required-field or business-rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldError {
    /// No uploaded audio URL
    AudioUrl,
    /// Blank prompt
    Prompt,
    /// Blank option text (zero-based index)
    OptionText(usize),
    /// Zero or several options marked correct
    CorrectOption,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioUrl => write!(f, "Audio (record or upload a file)"),
            Self::Prompt => write!(f, "Question"),
            Self::OptionText(i) => write!(f, "Option {} text", i + 1),
            Self::CorrectOption => write!(f, "Exactly one option marked as correct"),
        }
    }
}

/// The complete set of violations found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn contains(&self, error: FieldError) -> bool {
        self.errors.contains(&error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Please complete the following fields:")?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Per-field error flags shown next to the inputs.
///
/// Flags are raised only by [`ErrorFlags::apply`] after a validation pass and
/// lowered one at a time as the operator fixes fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFlags {
    pub audio_url: bool,
    pub prompt: bool,
    pub options: Vec<bool>,
    pub correct_option: bool,
}

impl ErrorFlags {
    /// Replace all flags with the outcome of a validation pass
    pub fn apply(&mut self, errors: &ValidationErrors, option_count: usize) {
        self.audio_url = errors.contains(FieldError::AudioUrl);
        self.prompt = errors.contains(FieldError::Prompt);
        self.correct_option = errors.contains(FieldError::CorrectOption);
        self.options = (0..option_count)
            .map(|i| errors.contains(FieldError::OptionText(i)))
            .collect();
    }

    pub fn any(&self) -> bool {
        self.audio_url || self.prompt || self.correct_option || self.options.iter().any(|f| *f)
    }

    pub fn option(&self, index: usize) -> bool {
        self.options.get(index).copied().unwrap_or(false)
    }

    pub fn clear_option(&mut self, index: usize) {
        if let Some(flag) = self.options.get_mut(index) {
            *flag = false;
        }
    }

    /// Keep option flags aligned after an option is removed
    pub fn remove_option(&mut self, index: usize) {
        if index < self.options.len() {
            self.options.remove(index);
        }
    }

    /// Keep option flags aligned after an option is appended
    pub fn push_option(&mut self) {
        if !self.options.is_empty() {
            self.options.push(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_are_ok() {
        assert_eq!(ValidationErrors::new().into_result(), Ok(()));
    }

    #[test]
    fn display_lists_every_error() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::Prompt);
        errors.push(FieldError::OptionText(1));
        let msg = errors.to_string();
        assert!(msg.contains("Question"));
        assert!(msg.contains("Option 2 text"));
    }

    #[test]
    fn flags_follow_errors() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::AudioUrl);
        errors.push(FieldError::OptionText(2));

        let mut flags = ErrorFlags::default();
        flags.apply(&errors, 3);
        assert!(flags.audio_url);
        assert!(!flags.prompt);
        assert_eq!(flags.options, vec![false, false, true]);

        flags.clear_option(2);
        flags.audio_url = false;
        assert!(!flags.any());
    }

    #[test]
    fn removing_option_shifts_flags() {
        let mut flags = ErrorFlags {
            options: vec![false, true, false],
            ..Default::default()
        };
        flags.remove_option(0);
        assert_eq!(flags.options, vec![true, false]);
        assert!(flags.option(0));
        assert!(!flags.option(9));
    }
}
