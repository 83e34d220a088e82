//! Encoding negotiation

use crate::domain::recording::{EncodingId, PREFERRED_ENCODINGS};

use super::ports::EncodingSupport;

/// Pick the first encoding in preference order that the platform supports.
///
/// Falls back to [`EncodingId::FALLBACK`] when nothing is reported.
pub fn negotiate_encoding(support: &dyn EncodingSupport) -> EncodingId {
    PREFERRED_ENCODINGS
        .into_iter()
        .find(|encoding| support.supports(*encoding))
        .unwrap_or(EncodingId::FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Supports(Vec<EncodingId>);

    impl EncodingSupport for Supports {
        fn supports(&self, encoding: EncodingId) -> bool {
            self.0.contains(&encoding)
        }
    }

    #[test]
    fn prefers_opus_when_available() {
        let support = Supports(vec![EncodingId::Wav, EncodingId::Flac, EncodingId::OggOpus]);
        assert_eq!(negotiate_encoding(&support), EncodingId::OggOpus);
    }

    #[test]
    fn skips_unsupported_preferences() {
        let support = Supports(vec![EncodingId::Wav, EncodingId::Flac]);
        assert_eq!(negotiate_encoding(&support), EncodingId::Flac);
    }

    #[test]
    fn falls_back_to_wav() {
        assert_eq!(negotiate_encoding(&Supports(vec![])), EncodingId::Wav);
        assert_eq!(
            negotiate_encoding(&Supports(vec![EncodingId::Wav])),
            EncodingId::Wav
        );
    }
}
