//! Duration value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DurationParseError;

/// Default recording ceiling (5 minutes)
pub const DEFAULT_MAX_RECORDING_SECS: u64 = 300;

/// Millisecond-precision span used for recording limits and elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default ceiling for a single recording
    pub const fn default_max_recording() -> Self {
        Self::from_secs(DEFAULT_MAX_RECORDING_SECS)
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Elapsed-time display: `m:ss`, seconds zero-padded.
    pub fn as_clock(&self) -> String {
        let total_secs = self.as_secs();
        format!("{}:{:02}", total_secs / 60, total_secs % 60)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Accepts `30s`, `2m`, `2m30s`. Minutes come before seconds and each
    /// unit appears at most once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_ascii_lowercase();

        let (minutes, rest) = match input.split_once('m') {
            Some((digits, rest)) => (Some(parse_amount(digits).ok_or_else(invalid)?), rest),
            None => (None, input.as_str()),
        };
        let seconds = match rest.strip_suffix('s') {
            Some(digits) => Some(parse_amount(digits).ok_or_else(invalid)?),
            None if rest.is_empty() => None,
            None => return Err(invalid()),
        };
        if minutes.is_none() && seconds.is_none() {
            return Err(invalid());
        }

        let total_secs = minutes
            .unwrap_or(0)
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds.unwrap_or(0)))
            .filter(|secs| *secs > 0)
            .ok_or_else(invalid)?;
        let milliseconds = total_secs.checked_mul(1000).ok_or_else(invalid)?;

        Ok(Self { milliseconds })
    }
}

/// Non-empty run of ASCII digits
fn parse_amount(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.as_secs() / 60, self.as_secs() % 60) {
            (0, secs) => write!(f, "{}s", secs),
            (mins, 0) => write!(f, "{}m", mins),
            (mins, secs) => write!(f, "{}m{}s", mins, secs),
        }
    }
}
