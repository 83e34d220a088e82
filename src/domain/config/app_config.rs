//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::audio_item::Level;
use crate::domain::recording::Duration;

/// Where uploaded audio ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Firebase,
    Local,
}

impl StorageBackend {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::Local => "local",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "local" => Ok(Self::Local),
            _ => Err(format!(
                "Invalid storage backend: \"{}\". Valid backends are: firebase, local",
                s
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Firebase project settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub bucket: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: Option<String>,
    pub local_storage_dir: Option<String>,
    pub max_recording: Option<String>,
    pub default_level: Option<String>,
    pub firebase: Option<FirebaseConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            storage: Some("firebase".to_string()),
            local_storage_dir: None,
            max_recording: Some("5m".to_string()),
            default_level: Some("A1".to_string()),
            firebase: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            storage: other.storage.or(self.storage),
            local_storage_dir: other.local_storage_dir.or(self.local_storage_dir),
            max_recording: other.max_recording.or(self.max_recording),
            default_level: other.default_level.or(self.default_level),
            firebase: Self::merge_firebase_config(self.firebase, other.firebase),
        }
    }

    /// Merge Firebase config sections
    fn merge_firebase_config(
        base: Option<FirebaseConfig>,
        other: Option<FirebaseConfig>,
    ) -> Option<FirebaseConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(FirebaseConfig {
                project_id: o.project_id.or(b.project_id),
                api_key: o.api_key.or(b.api_key),
                auth_token: o.auth_token.or(b.auth_token),
                bucket: o.bucket.or(b.bucket),
            }),
        }
    }

    /// Get storage backend, or Firebase if not set/invalid
    pub fn storage_or_default(&self) -> StorageBackend {
        self.storage
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get the local storage root, or `<data dir>/nivelver-admin/audio`
    pub fn local_storage_dir_or_default(&self) -> PathBuf {
        self.local_storage_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("nivelver-admin")
                    .join("audio")
            })
    }

    /// Get max_recording as parsed Duration, or default if not set/invalid
    pub fn max_recording_or_default(&self) -> Duration {
        self.max_recording
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_recording)
    }

    /// Get default level, or A1 if not set/invalid
    pub fn default_level_or_default(&self) -> Level {
        self.default_level
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.firebase.as_ref().and_then(|f| f.project_id.as_deref())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.firebase.as_ref().and_then(|f| f.api_key.as_deref())
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.firebase.as_ref().and_then(|f| f.auth_token.as_deref())
    }

    /// Get the storage bucket, or `<project_id>.appspot.com`
    pub fn bucket_or_default(&self) -> Option<String> {
        self.firebase
            .as_ref()
            .and_then(|f| f.bucket.clone())
            .or_else(|| self.project_id().map(|p| format!("{}.appspot.com", p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.storage, Some("firebase".to_string()));
        assert_eq!(config.max_recording, Some("5m".to_string()));
        assert_eq!(config.default_level, Some("A1".to_string()));
        assert!(config.firebase.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.storage.is_none());
        assert!(config.max_recording.is_none());
        assert!(config.firebase.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            storage: Some("firebase".to_string()),
            max_recording: Some("2m".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            storage: Some("local".to_string()),
            max_recording: None,
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.storage_or_default(), StorageBackend::Local);
        assert_eq!(merged.max_recording, Some("2m".to_string()));
    }

    #[test]
    fn merge_firebase_sections_field_by_field() {
        let base = AppConfig {
            firebase: Some(FirebaseConfig {
                project_id: Some("nivelver".to_string()),
                api_key: Some("file-key".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let other = AppConfig {
            firebase: Some(FirebaseConfig {
                api_key: Some("env-key".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.project_id(), Some("nivelver"));
        assert_eq!(merged.api_key(), Some("env-key"));
        assert!(merged.auth_token().is_none());
    }

    #[test]
    fn bucket_defaults_to_project_appspot() {
        let config = AppConfig {
            firebase: Some(FirebaseConfig {
                project_id: Some("nivelver".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            config.bucket_or_default(),
            Some("nivelver.appspot.com".to_string())
        );
        assert!(AppConfig::empty().bucket_or_default().is_none());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = AppConfig {
            storage: Some("s3".to_string()),
            max_recording: Some("forever".to_string()),
            default_level: Some("C2".to_string()),
            ..Default::default()
        };
        assert_eq!(config.storage_or_default(), StorageBackend::Firebase);
        assert_eq!(config.max_recording_or_default().as_secs(), 300);
        assert_eq!(config.default_level_or_default(), Level::A1);
    }

    #[test]
    fn local_storage_dir_uses_configured_path() {
        let config = AppConfig {
            local_storage_dir: Some("/srv/audio".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.local_storage_dir_or_default(),
            PathBuf::from("/srv/audio")
        );
    }

    #[test]
    fn storage_backend_parsing() {
        assert_eq!("LOCAL".parse::<StorageBackend>(), Ok(StorageBackend::Local));
        assert!("ftp".parse::<StorageBackend>().is_err());
    }
}
