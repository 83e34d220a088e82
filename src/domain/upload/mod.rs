//! Upload rules: size ceiling, declared media types and object naming

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::audio_item::Level;

/// Largest payload accepted for upload (10 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Top-level folder for audio objects
pub const AUDIO_PREFIX: &str = "audio";

/// Media type declared for a local file, derived from its extension.
///
/// Unknown extensions report `application/octet-stream`.
pub fn declared_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" | "weba" => "audio/webm",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "aac" => "audio/aac",
        "txt" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Whether a media type belongs to the audio category
pub fn is_audio_media_type(media_type: &str) -> bool {
    media_type.trim().to_ascii_lowercase().starts_with("audio/")
}

/// Unique destination of an uploaded object: `audio/{LEVEL}/{timestamp}-{suffix}.{ext}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(level: Level, at: DateTime<Utc>, suffix: &str, extension: &str) -> Self {
        Self(format!(
            "{}/{}/{}-{}.{}",
            AUDIO_PREFIX,
            level,
            at.format("%Y%m%dT%H%M%S%3f"),
            suffix,
            extension.trim_start_matches('.').to_ascii_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
