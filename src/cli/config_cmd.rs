//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::audio_item::Level;
use crate::domain::config::{AppConfig, FirebaseConfig, StorageBackend};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let value = normalize_value(key, value)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value.clone());
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, display_value(key, &value)));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;

    match read_value(&config, key) {
        Some(v) => presenter.output(&display_value(key, v)),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key)
            .map(|v| display_value(key, v))
            .unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate a value for its key and return the form that gets stored
fn normalize_value(key: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "storage" => value
            .parse::<StorageBackend>()
            .map(|b| b.to_string())
            .map_err(invalid),
        "max_recording" => value
            .parse::<Duration>()
            .map(|d| d.to_string())
            .map_err(|e| invalid(e.to_string())),
        "default_level" => value
            .parse::<Level>()
            .map(|l| l.to_string())
            .map_err(|e| invalid(e.to_string())),
        _ if value.trim().is_empty() => Err(invalid("Value must not be empty".to_string())),
        _ => Ok(value.trim().to_string()),
    }
}

fn apply_value(config: &mut AppConfig, key: &str, value: String) {
    match key.strip_prefix("firebase.") {
        Some(field) => {
            let firebase = config.firebase.get_or_insert_with(FirebaseConfig::default);
            match field {
                "project_id" => firebase.project_id = Some(value),
                "api_key" => firebase.api_key = Some(value),
                "auth_token" => firebase.auth_token = Some(value),
                "bucket" => firebase.bucket = Some(value),
                _ => {}
            }
        }
        None => match key {
            "storage" => config.storage = Some(value),
            "local_storage_dir" => config.local_storage_dir = Some(value),
            "max_recording" => config.max_recording = Some(value),
            "default_level" => config.default_level = Some(value),
            _ => {}
        },
    }
}

fn read_value<'a>(config: &'a AppConfig, key: &str) -> Option<&'a str> {
    let firebase = config.firebase.as_ref();
    match key {
        "storage" => config.storage.as_deref(),
        "local_storage_dir" => config.local_storage_dir.as_deref(),
        "max_recording" => config.max_recording.as_deref(),
        "default_level" => config.default_level.as_deref(),
        "firebase.project_id" => firebase.and_then(|f| f.project_id.as_deref()),
        "firebase.api_key" => firebase.and_then(|f| f.api_key.as_deref()),
        "firebase.auth_token" => firebase.and_then(|f| f.auth_token.as_deref()),
        "firebase.bucket" => firebase.and_then(|f| f.bucket.as_deref()),
        _ => None,
    }
}

/// Secrets are masked whenever they are echoed
fn display_value(key: &str, value: &str) -> String {
    match key {
        "firebase.api_key" | "firebase.auth_token" => mask_secret(value),
        _ => value.to_string(),
    }
}

/// Mask a secret for display (show first 4 and last 4 chars)
fn mask_secret(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn mask_secret_long() {
        assert_eq!(mask_secret("abcdefghijklmnop"), "abcd...mnop");
    }

    #[test]
    fn mask_secret_short() {
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn normalizes_level_and_backend() {
        assert_eq!(normalize_value("default_level", "b2").unwrap(), "B2");
        assert_eq!(normalize_value("storage", "LOCAL").unwrap(), "local");
    }

    #[test]
    fn validate_max_recording() {
        assert!(normalize_value("max_recording", "2m30s").is_ok());
        assert!(normalize_value("max_recording", "forever").is_err());
        assert!(normalize_value("max_recording", "0s").is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(normalize_value("default_level", "C1").is_err());
        assert!(normalize_value("storage", "s3").is_err());
        assert!(normalize_value("firebase.bucket", "  ").is_err());
    }

    #[test]
    fn firebase_keys_land_in_nested_table() {
        let mut config = AppConfig::empty();
        apply_value(&mut config, "firebase.project_id", "nivelver".into());
        apply_value(&mut config, "storage", "local".into());

        assert_eq!(config.project_id(), Some("nivelver"));
        assert_eq!(read_value(&config, "firebase.project_id"), Some("nivelver"));
        assert_eq!(read_value(&config, "storage"), Some("local"));
        assert_eq!(read_value(&config, "firebase.bucket"), None);
    }

    #[tokio::test]
    async fn set_persists_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "firebase.api_key", "secret-key-123")
            .await
            .unwrap();
        handle_set(&store, &presenter, "default_level", "a2")
            .await
            .unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.api_key(), Some("secret-key-123"));
        assert_eq!(config.default_level.as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn set_rejects_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));

        let result = handle_set(&store, &Presenter::new(), "api_key", "x").await;
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
        assert!(!store.exists());
    }
}
