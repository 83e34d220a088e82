//! Audio item domain module

mod item;
mod level;
mod options;
mod validation;

pub use item::{AudioItem, AudioItemRecord, OptionRecord, StoredAudioItem, AUDIO_COLLECTION};
pub use level::{Level, ALL_LEVELS};
pub use options::{
    AnswerOption, AnswerOptions, OptionsError, DEFAULT_OPTION_COUNT, MAX_OPTIONS, MIN_OPTIONS,
};
pub use validation::{ErrorFlags, FieldError, ValidationErrors};
