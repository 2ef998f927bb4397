//! Domain error types

use thiserror::Error;

use super::job::JobId;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 3s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a file cannot be admitted for submission
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Unsupported file type: \"{name}\". Supported formats: mp4, webm, mp3, wav")]
    UnsupportedType { name: String },

    #[error("File is empty: \"{name}\"")]
    Empty { name: String },

    #[error("Failed to read \"{path}\": {message}")]
    Unreadable { path: String, message: String },
}

/// Error when the server returns a response that contradicts its own status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Job {job_id} completed without a transcript")]
    MissingTranscript { job_id: JobId },
}

/// Processing failure reported by the server for a job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Processing failed: {message}")]
pub struct JobError {
    pub message: String,
}

impl JobError {
    /// Message used when the server reports an error without detail
    pub const UNKNOWN: &'static str = "Unknown error";

    /// Build from the optional server message, defaulting to "Unknown error"
    pub fn from_server(message: Option<String>) -> Self {
        Self {
            message: message.unwrap_or_else(|| Self::UNKNOWN.to_string()),
        }
    }
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
