//! CLI layer - Command-line interface
//!
//! Contains argument parsing, console presentation, signal handling,
//! the config subcommand and the one-shot runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod console;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    run_oneshot, run_upload, UploadOptions, EXIT_CANCELLED, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction};
pub use console::ConsoleEvents;
pub use presenter::Presenter;
