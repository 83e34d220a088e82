//! Answer options value objects

use thiserror::Error;

/// Fewest options an item may have
pub const MIN_OPTIONS: usize = 2;

/// Most options an item may have
pub const MAX_OPTIONS: usize = 8;

/// Options a fresh form starts with
pub const DEFAULT_OPTION_COUNT: usize = 3;

/// Errors raised by operations on the options sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("There must be at least {MIN_OPTIONS} options")]
    TooFew,

    #[error("There can be at most {MAX_OPTIONS} options")]
    TooMany,

    #[error("Option {index} does not exist (there are {len} options)")]
    OutOfRange { index: usize, len: usize },

    #[error("Only one option can be marked as correct")]
    MultipleCorrect,
}

/// A single answer option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }

    /// Whether the text is blank once trimmed
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Bounded sequence of answer options.
///
/// Holds between [`MIN_OPTIONS`] and [`MAX_OPTIONS`] entries with at most one
/// marked correct. Zero correct options is a valid editing state; validation
/// catches it before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions {
    options: Vec<AnswerOption>,
}

impl AnswerOptions {
    /// Build from a list, rejecting sizes outside the bounds and more than one
    /// correct option
    pub fn try_new(options: Vec<AnswerOption>) -> Result<Self, OptionsError> {
        if options.len() < MIN_OPTIONS {
            return Err(OptionsError::TooFew);
        }
        if options.len() > MAX_OPTIONS {
            return Err(OptionsError::TooMany);
        }
        if options.iter().filter(|o| o.is_correct).count() > 1 {
            return Err(OptionsError::MultipleCorrect);
        }
        Ok(Self { options })
    }

    /// Build from persisted data that may predate the invariants.
    ///
    /// Pads to the minimum with empty options, truncates past the maximum and
    /// keeps only the first correct flag.
    pub fn hydrate(mut options: Vec<AnswerOption>) -> Self {
        options.truncate(MAX_OPTIONS);
        while options.len() < MIN_OPTIONS {
            options.push(AnswerOption::default());
        }
        let mut seen_correct = false;
        for option in &mut options {
            if option.is_correct {
                option.is_correct = !seen_correct;
                seen_correct = true;
            }
        }
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Always false: the sequence never drops below the minimum
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnswerOption> {
        self.options.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerOption> {
        self.options.iter()
    }

    pub fn as_slice(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Index of the correct option, if one is marked
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.is_correct)
    }

    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }

    /// Indices of options whose text is blank
    pub fn blank_indices(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_blank())
            .map(|(i, _)| i)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), OptionsError> {
        if index >= self.options.len() {
            return Err(OptionsError::OutOfRange {
                index,
                len: self.options.len(),
            });
        }
        Ok(())
    }

    /// Replace the text of one option
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), OptionsError> {
        self.check_index(index)?;
        self.options[index].text = text.into();
        Ok(())
    }

    /// Mark one option correct and every other option incorrect
    pub fn mark_correct(&mut self, index: usize) -> Result<(), OptionsError> {
        self.check_index(index)?;
        for (i, option) in self.options.iter_mut().enumerate() {
            option.is_correct = i == index;
        }
        Ok(())
    }

    /// Append an empty option
    pub fn push_empty(&mut self) -> Result<(), OptionsError> {
        if self.options.len() >= MAX_OPTIONS {
            return Err(OptionsError::TooMany);
        }
        self.options.push(AnswerOption::default());
        Ok(())
    }

    /// Remove one option. Leaves the sequence untouched on error.
    pub fn remove(&mut self, index: usize) -> Result<AnswerOption, OptionsError> {
        self.check_index(index)?;
        if self.options.len() <= MIN_OPTIONS {
            return Err(OptionsError::TooFew);
        }
        Ok(self.options.remove(index))
    }
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            options: vec![AnswerOption::default(); DEFAULT_OPTION_COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(texts: &[&str]) -> AnswerOptions {
        AnswerOptions::try_new(texts.iter().map(|t| AnswerOption::new(*t, false)).collect())
            .unwrap()
    }

    #[test]
    fn default_has_three_blank_options() {
        let opts = AnswerOptions::default();
        assert_eq!(opts.len(), 3);
        assert_eq!(opts.blank_indices(), vec![0, 1, 2]);
        assert_eq!(opts.correct_index(), None);
    }

    #[test]
    fn try_new_enforces_bounds() {
        assert_eq!(
            AnswerOptions::try_new(vec![AnswerOption::default()]),
            Err(OptionsError::TooFew)
        );
        assert_eq!(
            AnswerOptions::try_new(vec![AnswerOption::default(); MAX_OPTIONS + 1]),
            Err(OptionsError::TooMany)
        );
        assert_eq!(
            AnswerOptions::try_new(vec![
                AnswerOption::new("a", true),
                AnswerOption::new("b", true)
            ]),
            Err(OptionsError::MultipleCorrect)
        );
    }

    #[test]
    fn mark_correct_is_exclusive_from_any_prior_state() {
        let priors: Vec<Vec<bool>> = vec![
            vec![false, false, false],
            vec![true, false, false],
            vec![false, false, true],
        ];
        for prior in priors {
            let mut opts = AnswerOptions::hydrate(
                prior
                    .iter()
                    .map(|c| AnswerOption::new("x", *c))
                    .collect(),
            );
            for target in 0..opts.len() {
                opts.mark_correct(target).unwrap();
                assert_eq!(opts.correct_count(), 1);
                assert_eq!(opts.correct_index(), Some(target));
            }
        }
    }

    #[test]
    fn mark_correct_out_of_range_changes_nothing() {
        let mut opts = options(&["a", "b"]);
        opts.mark_correct(0).unwrap();
        let before = opts.clone();
        assert_eq!(
            opts.mark_correct(5),
            Err(OptionsError::OutOfRange { index: 5, len: 2 })
        );
        assert_eq!(opts, before);
    }

    #[test]
    fn remove_below_floor_is_rejected_and_unchanged() {
        let mut opts = options(&["a", "b"]);
        let before = opts.clone();
        assert_eq!(opts.remove(0), Err(OptionsError::TooFew));
        assert_eq!(opts, before);
    }

    #[test]
    fn remove_above_floor() {
        let mut opts = options(&["a", "b", "c"]);
        let removed = opts.remove(1).unwrap();
        assert_eq!(removed.text, "b");
        let texts: Vec<&str> = opts.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn push_empty_stops_at_maximum() {
        let mut opts = AnswerOptions::default();
        while opts.len() < MAX_OPTIONS {
            opts.push_empty().unwrap();
        }
        assert_eq!(opts.push_empty(), Err(OptionsError::TooMany));
        assert_eq!(opts.len(), MAX_OPTIONS);
    }

    #[test]
    fn hydrate_pads_and_keeps_first_correct() {
        let opts = AnswerOptions::hydrate(vec![AnswerOption::new("only", true)]);
        assert_eq!(opts.len(), MIN_OPTIONS);

        let opts = AnswerOptions::hydrate(vec![
            AnswerOption::new("a", false),
            AnswerOption::new("b", true),
            AnswerOption::new("c", true),
        ]);
        assert_eq!(opts.correct_count(), 1);
        assert_eq!(opts.correct_index(), Some(1));
    }

    #[test]
    fn blank_means_whitespace_only() {
        assert!(AnswerOption::new("   ", false).is_blank());
        assert!(!AnswerOption::new(" x ", false).is_blank());
    }
}
