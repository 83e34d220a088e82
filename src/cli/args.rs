//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::audio_item::Level;
use crate::domain::config::StorageBackend;

/// NivelVer admin - curate audio comprehension items
#[derive(Parser, Debug)]
#[command(name = "nivelver-admin")]
#[command(version)]
#[command(about = "Record, preview, upload and publish NivelVer audio comprehension items")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or edit audio items
    Audio {
        #[command(subcommand)]
        action: AudioAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Audio item actions
#[derive(Subcommand, Debug)]
pub enum AudioAction {
    /// Create a new audio item
    New(ItemArgs),
    /// Edit an existing audio item
    Edit {
        /// Document id of the item
        id: String,
        #[command(flatten)]
        item: ItemArgs,
    },
}

/// Field values and audio source for one item
#[derive(Args, Debug, Clone, Default)]
pub struct ItemArgs {
    /// Proficiency level (A1, A2, B1, B2)
    #[arg(short = 'l', long, value_name = "LEVEL", value_parser = parse_level)]
    pub level: Option<Level>,

    /// Question shown with the audio
    #[arg(short = 'p', long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Answer option, repeat for each one (replaces existing options)
    #[arg(short = 'o', long = "option", value_name = "TEXT")]
    pub options: Vec<String>,

    /// Number of the correct option, starting at 1
    #[arg(short = 'c', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub correct: Option<u16>,

    /// Record the audio from the microphone (Enter stops, Ctrl-C cancels)
    #[arg(short = 'r', long, conflicts_with_all = ["file", "url"])]
    pub record: bool,

    /// Upload an existing audio file
    #[arg(short = 'f', long, value_name = "PATH", conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Use audio that is already hosted
    #[arg(short = 'u', long, value_name = "URL")]
    pub url: Option<String>,

    /// Play the recording back before uploading it
    #[arg(long, requires = "record")]
    pub preview: bool,

    /// Record uncompressed WAV instead of FLAC
    #[arg(long, requires = "record")]
    pub wav: bool,

    /// Upload without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Stop recording automatically after this long (e.g., 30s, 2m)
    #[arg(long, value_name = "TIME", requires = "record")]
    pub max_duration: Option<String>,

    /// Storage backend for uploads (firebase, local)
    #[arg(long, value_name = "BACKEND", value_parser = parse_storage)]
    pub storage: Option<StorageBackend>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|e| e.to_string())
}

fn parse_storage(s: &str) -> Result<StorageBackend, String> {
    s.parse::<StorageBackend>()
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "storage",
    "local_storage_dir",
    "max_recording",
    "default_level",
    "firebase.project_id",
    "firebase.api_key",
    "firebase.auth_token",
    "firebase.bucket",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn item_args(cli: Cli) -> ItemArgs {
        match cli.command {
            Commands::Audio {
                action: AudioAction::New(item),
            } => item,
            other => panic!("Expected audio new, got {:?}", other),
        }
    }

    #[test]
    fn audio_new_parses_fields() {
        let cli = Cli::parse_from([
            "nivelver-admin",
            "audio",
            "new",
            "-l",
            "b1",
            "-p",
            "¿Qué compra Luis?",
            "-o",
            "Pan",
            "-o",
            "Leche",
            "--correct",
            "2",
            "--url",
            "https://cdn.example/a.mp3",
        ]);
        let item = item_args(cli);

        assert_eq!(item.level, Some(Level::B1));
        assert_eq!(item.prompt.as_deref(), Some("¿Qué compra Luis?"));
        assert_eq!(item.options, vec!["Pan", "Leche"]);
        assert_eq!(item.correct, Some(2));
        assert_eq!(item.url.as_deref(), Some("https://cdn.example/a.mp3"));
        assert!(!item.record);
    }

    #[test]
    fn audio_edit_takes_id() {
        let cli = Cli::parse_from(["nivelver-admin", "audio", "edit", "abc123", "--record"]);
        match cli.command {
            Commands::Audio {
                action: AudioAction::Edit { id, item },
            } => {
                assert_eq!(id, "abc123");
                assert!(item.record);
            }
            other => panic!("Expected audio edit, got {:?}", other),
        }
    }

    #[test]
    fn audio_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "nivelver-admin",
            "audio",
            "new",
            "--record",
            "--file",
            "a.wav",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn preview_requires_record() {
        let result = Cli::try_parse_from(["nivelver-admin", "audio", "new", "--preview"]);
        assert!(result.is_err());
    }

    #[test]
    fn wav_requires_record() {
        assert!(Cli::try_parse_from(["nivelver-admin", "audio", "new", "--wav"]).is_err());
        let cli = Cli::parse_from(["nivelver-admin", "audio", "new", "--record", "--wav"]);
        assert!(item_args(cli).wav);
    }

    #[test]
    fn rejects_unknown_level() {
        let result = Cli::try_parse_from(["nivelver-admin", "audio", "new", "-l", "C2"]);
        assert!(result.is_err());
    }

    #[test]
    fn correct_is_one_based() {
        let result = Cli::try_parse_from(["nivelver-admin", "audio", "new", "-c", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn storage_override_is_validated() {
        let cli = Cli::parse_from(["nivelver-admin", "audio", "new", "--storage", "LOCAL"]);
        assert_eq!(item_args(cli).storage, Some(StorageBackend::Local));

        let result = Cli::try_parse_from(["nivelver-admin", "audio", "new", "--storage", "s3"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["nivelver-admin", "config", "set", "default_level", "B2"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "default_level");
            assert_eq!(value, "B2");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("storage"));
        assert!(is_valid_config_key("firebase.bucket"));
        assert!(!is_valid_config_key("bucket"));
        assert!(!is_valid_config_key("invalid_key"));
    }

    #[test]
    fn verify_cli() {
        // Verify the CLI definition is valid
        Cli::command().debug_assert();
    }
}
