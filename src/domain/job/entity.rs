//! Job entity

use super::{JobId, JobSnapshot, JobStatus};

/// One server-side transcription and minute-generation task.
///
/// Created when a submission returns an identifier and mutated only by
/// status responses. Once a terminal status has been applied the job is
/// finished and further snapshots are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    transcript: Option<String>,
    minutes: Option<String>,
    error: Option<String>,
}

impl Job {
    /// Create a freshly submitted job in the queued state
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            transcript: None,
            minutes: None,
            error: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn minutes(&self) -> Option<&str> {
        self.minutes.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a terminal status has been observed
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a status response. Returns `false` if the job had already finished.
    pub fn apply(&mut self, snapshot: JobSnapshot) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = snapshot.status;
        self.transcript = snapshot.transcript;
        self.minutes = snapshot.minutes;
        self.error = snapshot.error;
        true
    }
}
