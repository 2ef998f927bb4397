//! Presentation callback port

use crate::domain::job::JobStatus;
use crate::domain::session::{Progress, UploadPhase};

/// Receiver of upload and job lifecycle events.
///
/// Callbacks are synchronous and are never invoked after the orchestrator
/// that owns the job has cancelled it or been dropped. They run while the
/// orchestrator holds its session lock, so they arrive in transition order
/// and must not call back into the orchestrator.
pub trait UploadEvents: Send + Sync {
    /// Synthetic upload progress changed
    fn on_progress(&self, progress: Progress);

    /// Session moved to a new phase
    fn on_phase_change(&self, phase: UploadPhase);

    /// Job finished with displayable minutes
    fn on_complete(&self, transcript: &str, minutes: &str);

    /// Non-fatal condition worth telling the user about
    fn on_warning(&self, message: &str);

    /// Submission or job failed
    fn on_error(&self, message: &str);

    /// Informational notice
    fn on_info(&self, _message: &str) {}

    /// In-progress job status observed by a poll
    fn on_status(&self, _status: &JobStatus) {}
}
