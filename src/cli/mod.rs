//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, operator input handling,
//! and the audio item runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_audio, RunError, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{AudioAction, Cli, Commands, ConfigAction, ItemArgs};
pub use presenter::Presenter;
