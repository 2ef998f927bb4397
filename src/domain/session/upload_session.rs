//! Upload session state machine

use std::fmt;
use thiserror::Error;

use super::Progress;
use crate::domain::job::{JobId, Minutes};

/// Upload session phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Polling,
}

impl UploadPhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: UploadPhase,
    pub action: String,
}

/// How the most recent submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Server accepted the file without assigning a job to follow
    Accepted,
    Completed(Minutes),
    Failed(String),
    Cancelled,
}

/// Immutable view of the session for presentation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: UploadPhase,
    pub progress: Progress,
    pub job_id: Option<JobId>,
    pub outcome: Option<JobOutcome>,
}

/// Upload session entity.
/// Covers one file submission from upload through to a finished job.
///
/// State machine:
///   IDLE -> UPLOADING (begin_upload)
///   UPLOADING -> POLLING (finish_upload with a job id)
///   UPLOADING -> IDLE (finish_upload without a job id, fail_upload, cancel)
///   POLLING -> IDLE (finish_job, cancel)
#[derive(Debug, Default)]
pub struct UploadSession {
    phase: UploadPhase,
    progress: Progress,
    job_id: Option<JobId>,
    outcome: Option<JobOutcome>,
}

impl UploadSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == UploadPhase::Idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            progress: self.progress,
            job_id: self.job_id.clone(),
            outcome: self.outcome.clone(),
        }
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.phase,
            action: action.to_string(),
        }
    }

    /// Transition from IDLE to UPLOADING, resetting progress
    pub fn begin_upload(&mut self) -> Result<(), InvalidStateTransition> {
        if self.phase != UploadPhase::Idle {
            return Err(self.invalid("start an upload"));
        }
        self.phase = UploadPhase::Uploading;
        self.progress = Progress::ZERO;
        self.job_id = None;
        self.outcome = None;
        Ok(())
    }

    /// Advance synthetic progress while uploading.
    /// Returns the new value only when it changed.
    pub fn advance_progress(&mut self, step: u8, ceiling: u8) -> Option<Progress> {
        if self.phase != UploadPhase::Uploading {
            return None;
        }
        let next = self.progress.advance(step, ceiling);
        if next == self.progress {
            return None;
        }
        self.progress = next;
        Some(next)
    }

    /// Transition out of UPLOADING after the server accepted the file.
    /// With a job id the session starts polling; without one it is done.
    pub fn finish_upload(
        &mut self,
        job_id: Option<JobId>,
    ) -> Result<UploadPhase, InvalidStateTransition> {
        if self.phase != UploadPhase::Uploading {
            return Err(self.invalid("finish an upload"));
        }
        self.progress = Progress::COMPLETE;
        match job_id {
            Some(id) => {
                self.phase = UploadPhase::Polling;
                self.job_id = Some(id);
            }
            None => {
                self.phase = UploadPhase::Idle;
                self.outcome = Some(JobOutcome::Accepted);
            }
        }
        Ok(self.phase)
    }

    /// Transition from UPLOADING to IDLE after a failed submission
    pub fn fail_upload(&mut self, message: impl Into<String>) -> Result<(), InvalidStateTransition> {
        if self.phase != UploadPhase::Uploading {
            return Err(self.invalid("fail an upload"));
        }
        self.phase = UploadPhase::Idle;
        self.progress = Progress::ZERO;
        self.outcome = Some(JobOutcome::Failed(message.into()));
        Ok(())
    }

    /// Transition from POLLING to IDLE once the given job reached a terminal state.
    /// Outcomes for any other job are rejected.
    pub fn finish_job(
        &mut self,
        job_id: &JobId,
        outcome: JobOutcome,
    ) -> Result<(), InvalidStateTransition> {
        if self.phase != UploadPhase::Polling || self.job_id.as_ref() != Some(job_id) {
            return Err(self.invalid("finish a job"));
        }
        self.phase = UploadPhase::Idle;
        self.job_id = None;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Abandon the active upload or poll.
    /// Returns the job id when a poll was abandoned.
    pub fn cancel(&mut self) -> Result<Option<JobId>, InvalidStateTransition> {
        match self.phase {
            UploadPhase::Idle => Err(self.invalid("cancel")),
            UploadPhase::Uploading => {
                self.phase = UploadPhase::Idle;
                self.progress = Progress::ZERO;
                self.outcome = Some(JobOutcome::Cancelled);
                Ok(None)
            }
            UploadPhase::Polling => {
                self.phase = UploadPhase::Idle;
                self.outcome = Some(JobOutcome::Cancelled);
                Ok(self.job_id.take())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploading() -> UploadSession {
        let mut session = UploadSession::new();
        session.begin_upload().unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = UploadSession::new();
        assert!(session.is_idle());
        assert_eq!(session.progress(), Progress::ZERO);
        assert!(session.snapshot().outcome.is_none());
    }

    #[test]
    fn begin_upload_from_idle() {
        let session = uploading();
        assert_eq!(session.phase(), UploadPhase::Uploading);
    }

    #[test]
    fn begin_upload_while_active_fails() {
        let mut session = uploading();
        let err = session.begin_upload().unwrap_err();
        assert_eq!(err.current_state, UploadPhase::Uploading);
        assert!(err.action.contains("start an upload"));

        session.finish_upload(Some(JobId::new("j1"))).unwrap();
        let err = session.begin_upload().unwrap_err();
        assert_eq!(err.current_state, UploadPhase::Polling);
    }

    #[test]
    fn progress_only_advances_while_uploading() {
        let mut session = UploadSession::new();
        assert!(session.advance_progress(10, 90).is_none());

        session.begin_upload().unwrap();
        assert_eq!(session.advance_progress(10, 90), Some(Progress::new(10)));
        assert_eq!(session.advance_progress(10, 90), Some(Progress::new(20)));
    }

    #[test]
    fn progress_reports_no_change_at_ceiling() {
        let mut session = uploading();
        for _ in 0..9 {
            session.advance_progress(10, 90);
        }
        assert_eq!(session.progress().percent(), 90);
        assert!(session.advance_progress(10, 90).is_none());
    }

    #[test]
    fn finish_upload_with_job_starts_polling() {
        let mut session = uploading();
        let phase = session.finish_upload(Some(JobId::new("j1"))).unwrap();
        assert_eq!(phase, UploadPhase::Polling);
        assert_eq!(session.progress(), Progress::COMPLETE);
        assert_eq!(session.job_id(), Some(&JobId::new("j1")));
    }

    #[test]
    fn finish_upload_without_job_returns_to_idle() {
        let mut session = uploading();
        let phase = session.finish_upload(None).unwrap();
        assert_eq!(phase, UploadPhase::Idle);
        assert_eq!(session.snapshot().outcome, Some(JobOutcome::Accepted));
    }

    #[test]
    fn fail_upload_resets_progress() {
        let mut session = uploading();
        session.advance_progress(10, 90);
        session.fail_upload("HTTP 500").unwrap();
        assert!(session.is_idle());
        assert_eq!(session.progress(), Progress::ZERO);
        assert_eq!(
            session.snapshot().outcome,
            Some(JobOutcome::Failed("HTTP 500".to_string()))
        );
    }

    #[test]
    fn fail_upload_from_idle_fails() {
        let mut session = UploadSession::new();
        assert!(session.fail_upload("x").is_err());
    }

    #[test]
    fn finish_job_requires_matching_id() {
        let mut session = uploading();
        session.finish_upload(Some(JobId::new("j1"))).unwrap();

        assert!(session
            .finish_job(&JobId::new("other"), JobOutcome::Cancelled)
            .is_err());
        assert_eq!(session.phase(), UploadPhase::Polling);

        let minutes = Minutes::resolve("T", "M");
        session
            .finish_job(&JobId::new("j1"), JobOutcome::Completed(minutes.clone()))
            .unwrap();
        assert!(session.is_idle());
        assert!(session.job_id().is_none());
        assert_eq!(
            session.snapshot().outcome,
            Some(JobOutcome::Completed(minutes))
        );
    }

    #[test]
    fn cancel_while_polling_returns_job() {
        let mut session = uploading();
        session.finish_upload(Some(JobId::new("j1"))).unwrap();
        assert_eq!(session.cancel().unwrap(), Some(JobId::new("j1")));
        assert!(session.is_idle());
        assert_eq!(session.snapshot().outcome, Some(JobOutcome::Cancelled));
    }

    #[test]
    fn cancel_while_uploading_resets_progress() {
        let mut session = uploading();
        session.advance_progress(10, 90);
        assert_eq!(session.cancel().unwrap(), None);
        assert_eq!(session.progress(), Progress::ZERO);
    }

    #[test]
    fn cancel_from_idle_fails() {
        let mut session = UploadSession::new();
        let err = session.cancel().unwrap_err();
        assert_eq!(err.current_state, UploadPhase::Idle);
    }

    #[test]
    fn phase_display() {
        assert_eq!(UploadPhase::Idle.to_string(), "idle");
        assert_eq!(UploadPhase::Uploading.to_string(), "uploading");
        assert_eq!(UploadPhase::Polling.to_string(), "polling");
    }
}
