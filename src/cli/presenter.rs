//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::{PendingSummary, UploadResult};
use crate::domain::audio_item::{AudioItem, ValidationErrors};
use crate::domain::recording::{human_readable_size, Duration};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        self.stop_spinner();
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}");
        if let Ok(style) = style {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (ids and config values)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Format the recording status line
    pub fn format_recording(&self, elapsed: Duration, max: Duration) -> String {
        format!(
            "Recording… {} / {}  {}",
            elapsed.as_clock(),
            max.as_clock(),
            "(Enter to stop, Ctrl-C to cancel)".dimmed()
        )
    }

    /// Show the recording spinner
    pub fn show_recording(&mut self, max: Duration) {
        let message = self.format_recording(Duration::from_secs(0), max);
        self.start_spinner(&message);
    }

    /// Update the elapsed time shown by the recording spinner
    pub fn update_recording(&self, elapsed: Duration, max: Duration) {
        self.update_spinner(&self.format_recording(elapsed, max));
    }

    /// Describe a stopped recording
    pub fn format_pending(&self, pending: &PendingSummary) -> String {
        format!(
            "{} recording, {} ({})",
            pending.encoding,
            pending.duration.as_clock(),
            human_readable_size(pending.size_bytes)
        )
    }

    /// Report a finished upload
    pub fn upload_done(&mut self, upload: &UploadResult) {
        self.spinner_success(&format!(
            "Uploaded {} ({})",
            upload.object_path,
            human_readable_size(upload.size_bytes)
        ));
    }

    /// List every validation problem at once
    pub fn validation_summary(&self, errors: &ValidationErrors) {
        eprintln!(
            "{} {}",
            "✗".red(),
            "Complete the following fields before saving:".bold()
        );
        for line in Self::validation_lines(errors) {
            eprintln!("  {} {}", "•".red(), line);
        }
    }

    fn validation_lines(errors: &ValidationErrors) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    /// Print the item as it will be saved
    pub fn item_summary(&self, item: &AudioItem) {
        self.key_value("level", item.level.as_str());
        self.key_value("prompt", &item.prompt);
        self.key_value("audio", item.audio_url.as_deref().unwrap_or("(none)"));
        for (index, option) in item.options.iter().enumerate() {
            let marker = if option.is_correct {
                "●".green()
            } else {
                "○".normal()
            };
            println!("  {} {}. {}", marker, index + 1, option.text);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio_item::FieldError;

    #[test]
    fn format_recording_at_start() {
        let presenter = Presenter::new();
        let line = presenter.format_recording(Duration::from_secs(0), Duration::from_secs(300));
        assert!(line.contains("0:00 / 5:00"));
    }

    #[test]
    fn format_recording_past_a_minute() {
        let presenter = Presenter::new();
        let line = presenter.format_recording(Duration::from_secs(65), Duration::from_secs(300));
        assert!(line.contains("1:05"));
    }

    #[test]
    fn validation_lines_list_every_problem() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::Prompt);
        errors.push(FieldError::OptionText(0));
        errors.push(FieldError::OptionText(2));

        let lines = Presenter::validation_lines(&errors);
        assert_eq!(lines, vec!["Question", "Option 1 text", "Option 3 text"]);
    }
}
