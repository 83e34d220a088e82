//! Encoding identifiers negotiated for a recording session

use std::fmt;

/// Audio encodings the capture pipeline knows how to produce,
/// listed from most to least preferred.
pub const PREFERRED_ENCODINGS: [EncodingId; 3] =
    [EncodingId::OggOpus, EncodingId::Flac, EncodingId::Wav];

/// Identifier of a negotiated recording encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingId {
    /// Opus in an Ogg container
    OggOpus,
    /// Lossless FLAC
    Flac,
    /// 16-bit PCM WAV, supported everywhere
    Wav,
}

impl EncodingId {
    /// The encoding every conforming platform can produce
    pub const FALLBACK: Self = Self::Wav;

    /// Get the MIME type string
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::OggOpus => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::OggOpus => "ogg",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for EncodingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

impl Default for EncodingId {
    fn default() -> Self {
        Self::FALLBACK
    }
}
