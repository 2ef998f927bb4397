//! Job status and the server's job payloads

use std::fmt;

use serde::Deserialize;

use super::JobId;

/// Processing status of a job as reported by the server.
///
/// Unrecognized wire values are kept as `Unknown` and treated as still
/// in progress, so newer server states never stop a poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Queued,
    Transcribing,
    GeneratingMinutes,
    Completed,
    Error,
    Unknown(String),
}

impl JobStatus {
    /// Get the wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Transcribing => "transcribing",
            Self::GeneratingMinutes => "generating_minutes",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }

    /// `completed` and `error` end a job's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Short human-readable label for status lines
    pub fn label(&self) -> &str {
        match self {
            Self::Queued => "Queued",
            Self::Transcribing => "Transcribing",
            Self::GeneratingMinutes => "Generating minutes",
            Self::Completed => "Completed",
            Self::Error => "Failed",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "transcribing" => Self::Transcribing,
            "generating_minutes" => Self::GeneratingMinutes,
            "completed" => Self::Completed,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to a file submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobReceipt {
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

impl JobReceipt {
    /// The assigned job identifier, if the server returned a usable one
    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref().filter(|id| !id.is_empty())
    }

    pub fn into_job_id(self) -> Option<JobId> {
        self.job_id.filter(|id| !id.is_empty())
    }
}

/// Point-in-time view of a job returned by a status request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub minutes: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Snapshot carrying only a status
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            transcript: None,
            minutes: None,
            error: None,
        }
    }
}
