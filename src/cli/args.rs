//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::config::AppConfig;

/// Meeting Minutes - upload a recording and get back formatted minutes
#[derive(Parser, Debug)]
#[command(name = "meeting-minutes")]
#[command(version)]
#[command(about = "Upload a meeting recording for transcription and minute generation")]
#[command(long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Recording to upload (mp4, webm, mp3, wav)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Transcription service base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Time between status checks (e.g., 500ms, 3s, 1m)
    #[arg(long, value_name = "TIME")]
    pub poll_interval: Option<String>,

    /// Give up after this many consecutive failed status checks
    #[arg(long, value_name = "N")]
    pub max_poll_failures: Option<u32>,

    /// Write the minutes to a file instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the raw transcript to a file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Configuration layer contributed by command-line flags
    pub fn config_overrides(&self) -> AppConfig {
        AppConfig {
            api_url: self.api_url.clone(),
            poll_interval: self.poll_interval.clone(),
            max_poll_failures: self.max_poll_failures,
            notify: self.notify.then_some(true),
            ..Default::default()
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_url",
    "poll_interval",
    "max_poll_failures",
    "request_timeout",
    "notify",
    "output_dir",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
