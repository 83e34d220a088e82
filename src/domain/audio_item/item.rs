//! Audio item entity and its persisted record shape

use serde::{Deserialize, Serialize};

use super::level::Level;
use super::options::{AnswerOption, AnswerOptions};
use super::validation::{FieldError, ValidationErrors};

/// Collection holding audio items in the document store
pub const AUDIO_COLLECTION: &str = "audio";

/// Audio comprehension item as edited in the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioItem {
    pub level: Level,
    /// Public URL, set only after a successful upload
    pub audio_url: Option<String>,
    pub prompt: String,
    pub options: AnswerOptions,
}

impl AudioItem {
    /// Collect every violation in a single pass
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let has_url = self
            .audio_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !has_url {
            errors.push(FieldError::AudioUrl);
        }

        if self.prompt.trim().is_empty() {
            errors.push(FieldError::Prompt);
        }

        for index in self.options.blank_indices() {
            errors.push(FieldError::OptionText(index));
        }

        if self.options.correct_count() != 1 {
            errors.push(FieldError::CorrectOption);
        }

        errors.into_result()
    }

    /// Build the persisted record, trimming every string
    pub fn to_record(&self) -> Result<AudioItemRecord, ValidationErrors> {
        self.validate()?;
        Ok(AudioItemRecord {
            level: self.level,
            audio_url: self
                .audio_url
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            prompt: self.prompt.trim().to_string(),
            options: self
                .options
                .iter()
                .map(|o| OptionRecord {
                    text: o.text.trim().to_string(),
                    is_correct: o.is_correct,
                })
                .collect(),
        })
    }

    /// Hydrate from a persisted record
    pub fn from_record(record: AudioItemRecord) -> Self {
        let audio_url = Some(record.audio_url).filter(|url| !url.trim().is_empty());
        Self {
            level: record.level,
            audio_url,
            prompt: record.prompt,
            options: AnswerOptions::hydrate(
                record
                    .options
                    .into_iter()
                    .map(|o| AnswerOption::new(o.text, o.is_correct))
                    .collect(),
            ),
        }
    }
}

/// Persisted shape of an answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    #[serde(rename = "texto", default)]
    pub text: String,
    #[serde(rename = "correcta", default)]
    pub is_correct: bool,
}

/// Persisted shape of an audio item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioItemRecord {
    #[serde(rename = "nivel", default)]
    pub level: Level,
    #[serde(rename = "audioUrl", default)]
    pub audio_url: String,
    #[serde(rename = "pregunta", default)]
    pub prompt: String,
    #[serde(rename = "opciones", default)]
    pub options: Vec<OptionRecord>,
}

/// A record together with its document id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudioItem {
    pub id: String,
    pub record: AudioItemRecord,
}
