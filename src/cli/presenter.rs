//! CLI presenter for output formatting

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TICK: StdDuration = StdDuration::from_millis(80);

/// Presenter for CLI output formatting.
///
/// Holds at most one live indicator (upload bar or poll spinner); status
/// lines printed while it is visible are drawn above it.
pub struct Presenter {
    indicator: Mutex<Option<ProgressBar>>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            indicator: Mutex::new(None),
        }
    }

    fn indicator(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.indicator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_indicator(&self, next: Option<ProgressBar>) {
        if let Some(previous) = std::mem::replace(&mut *self.indicator(), next) {
            previous.finish_and_clear();
        }
    }

    /// Print a line without tearing the active indicator
    fn line(&self, text: String) {
        let indicator = self.indicator().clone();
        match indicator {
            Some(bar) => bar.suspend(|| eprintln!("{}", text)),
            None => eprintln!("{}", text),
        }
    }

    /// Show the upload progress bar
    pub fn start_upload(&self, file_name: &str) {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(format!("Uploading {}", file_name));
        self.replace_indicator(Some(bar));
    }

    /// Move the upload bar to `percent`
    pub fn set_upload_progress(&self, percent: u8) {
        if let Some(ref bar) = *self.indicator() {
            bar.set_position(u64::from(percent));
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(SPINNER_TICK);
        self.replace_indicator(Some(spinner));
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = *self.indicator() {
            spinner.set_message(message.to_string());
        }
    }

    /// Finish the active indicator with a success line
    pub fn finish_success(&self, message: &str) {
        let indicator = self.indicator().take();
        match indicator {
            Some(bar) => bar.finish_with_message(format!("{} {}", "✓".green(), message)),
            None => self.success(message),
        }
    }

    /// Clear the active indicator, if any
    pub fn clear(&self) {
        self.replace_indicator(None);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.line(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.line(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.line(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout (the minutes themselves)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.clear();
    }
}
