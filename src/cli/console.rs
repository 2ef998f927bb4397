//! Console presentation of upload and job events

use std::sync::Arc;

use crate::application::ports::UploadEvents;
use crate::domain::job::JobStatus;
use crate::domain::session::{Progress, UploadPhase};

use super::presenter::Presenter;

/// Shown once the minutes are ready
pub const COMPLETE_MESSAGE: &str = "Transcription complete!";

/// Renders orchestrator events on the terminal
pub struct ConsoleEvents {
    presenter: Arc<Presenter>,
    file_name: String,
}

impl ConsoleEvents {
    pub fn new(presenter: Arc<Presenter>, file_name: impl Into<String>) -> Self {
        Self {
            presenter,
            file_name: file_name.into(),
        }
    }
}

impl UploadEvents for ConsoleEvents {
    fn on_progress(&self, progress: Progress) {
        self.presenter.set_upload_progress(progress.percent());
    }

    fn on_phase_change(&self, phase: UploadPhase) {
        match phase {
            UploadPhase::Uploading => self.presenter.start_upload(&self.file_name),
            UploadPhase::Polling => self
                .presenter
                .start_spinner(JobStatus::Queued.label()),
            UploadPhase::Idle => self.presenter.clear(),
        }
    }

    fn on_complete(&self, _transcript: &str, _minutes: &str) {
        self.presenter.finish_success(COMPLETE_MESSAGE);
    }

    fn on_warning(&self, message: &str) {
        self.presenter.warn(message);
    }

    fn on_error(&self, message: &str) {
        self.presenter.clear();
        self.presenter.error(message);
    }

    fn on_info(&self, message: &str) {
        self.presenter.info(message);
    }

    fn on_status(&self, status: &JobStatus) {
        self.presenter.update_spinner(status.label());
    }
}
