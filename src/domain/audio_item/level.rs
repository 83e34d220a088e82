//! Proficiency level value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidLevelError;

/// All proficiency levels, in ascending order
pub const ALL_LEVELS: &[Level] = &[Level::A1, Level::A2, Level::B1, Level::B2];

/// Proficiency tier attached to every audio item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
}

impl Level {
    /// Get the canonical (upper-case) identifier
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
        }
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            _ => Err(InvalidLevelError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_levels() {
        for level in ALL_LEVELS {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), *level);
        }
    }

    #[test]
    fn parse_case_insensitive_with_whitespace() {
        assert_eq!(" b1 ".parse::<Level>().unwrap(), Level::B1);
        assert_eq!("a2".parse::<Level>().unwrap(), Level::A2);
    }

    #[test]
    fn parse_invalid() {
        assert!("C1".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Level::A1 < Level::A2);
        assert!(Level::A2 < Level::B1);
        assert!(Level::B1 < Level::B2);
    }

    #[test]
    fn serializes_as_upper_case() {
        assert_eq!(serde_json::to_string(&Level::B2).unwrap(), "\"B2\"");
    }

    #[test]
    fn default_is_a1() {
        assert_eq!(Level::default(), Level::A1);
    }
}
