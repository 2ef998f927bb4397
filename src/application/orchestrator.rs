//! Upload orchestrator use case
//!
//! Coordinates one file submission end to end: the submit call, synthetic
//! progress while it is in flight, and the hand-off to the job poller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::job::{JobId, JobReceipt, JobStatus, Minutes};
use crate::domain::media::MediaFile;
use crate::domain::session::{
    InvalidStateTransition, JobOutcome, Progress, SessionSnapshot, UploadPhase, UploadSession,
};

use super::poller::{JobPoller, PollCallbacks, PollFailure, PollerConfig};
use super::ports::{JobTransport, TransportError, UploadEvents};
use super::progress::{ProgressConfig, ProgressSimulator};

/// Shown while the server works on a freshly submitted job
pub const PROCESSING_NOTICE: &str = "Processing your recording. This may take a few moments...";

/// Shown when the server returned no usable minutes
pub const FALLBACK_WARNING: &str =
    "No formatted minutes were generated. Showing raw transcript instead.";

/// Errors from the upload use case.
///
/// Transport failures are reported through `UploadEvents` before they are
/// returned. `Busy` leaves the active session alone and emits nothing.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("An upload is already in progress: {0}")]
    Busy(#[from] InvalidStateTransition),

    #[error("Failed to upload recording: {0}")]
    Transport(#[from] TransportError),
}

/// How a call to `submit` ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server returned a job; polling has started
    Polling(JobId),
    /// Server accepted the file without a job to follow
    Accepted,
    /// The upload was cancelled before the server answered
    Cancelled,
}

/// Configuration for the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub poll: PollerConfig,
    pub progress: ProgressConfig,
}

/// Session state shared with poll and progress callbacks.
///
/// Every event is emitted while the session lock is held, right after the
/// transition it reports. A callback that lost a race with `cancel` or with
/// the end of the upload therefore sees the new state and stays silent.
struct Shared<E: UploadEvents> {
    session: Mutex<UploadSession>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: Arc<E>,
    /// Bumped under the session lock each time an upload begins
    uploads: AtomicU64,
}

impl<E: UploadEvents> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, UploadSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change to the session, emitting events from inside `change`,
    /// then publish the new snapshot
    fn update<R>(&self, change: impl FnOnce(&mut UploadSession, &E) -> R) -> R {
        let mut session = self.lock();
        let result = change(&mut session, &self.events);
        self.snapshots.send_replace(session.snapshot());
        result
    }

    /// Emit an event only while the given job is still being polled
    fn while_polling(&self, job_id: &JobId, emit: impl FnOnce(&E)) {
        let session = self.lock();
        if session.phase() == UploadPhase::Polling && session.job_id() == Some(job_id) {
            emit(&self.events);
        }
    }

    fn current_upload(&self) -> u64 {
        self.uploads.load(Ordering::Acquire)
    }
}

/// Upload orchestrator.
///
/// Owns the single upload session. Only one submission may be active at a
/// time; dropping the orchestrator stops its timers and poll loops.
pub struct UploadOrchestrator<T, E>
where
    T: JobTransport + 'static,
    E: UploadEvents + 'static,
{
    transport: Arc<T>,
    poller: JobPoller<T>,
    progress: ProgressSimulator,
    shared: Arc<Shared<E>>,
    upload_token: Mutex<Option<CancellationToken>>,
}

impl<T, E> UploadOrchestrator<T, E>
where
    T: JobTransport + 'static,
    E: UploadEvents + 'static,
{
    /// Create a new orchestrator
    pub fn new(transport: T, events: E, config: OrchestratorConfig) -> Self {
        Self::with_shared(Arc::new(transport), Arc::new(events), config)
    }

    /// Create an orchestrator around shared transport and event sink
    pub fn with_shared(transport: Arc<T>, events: Arc<E>, config: OrchestratorConfig) -> Self {
        let session = UploadSession::new();
        let (snapshots, _) = watch::channel(session.snapshot());
        Self {
            poller: JobPoller::new(Arc::clone(&transport), config.poll),
            transport,
            progress: ProgressSimulator::new(config.progress),
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                snapshots,
                events,
                uploads: AtomicU64::new(0),
            }),
            upload_token: Mutex::new(None),
        }
    }

    /// Get the current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Current phase
    pub fn phase(&self) -> UploadPhase {
        self.snapshot().phase
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Wait until the session is idle again and return its final state
    pub async fn wait_idle(&self) -> SessionSnapshot {
        let mut receiver = self.subscribe();
        let result = receiver
            .wait_for(|snapshot| snapshot.phase == UploadPhase::Idle)
            .await
            .map(|snapshot| snapshot.clone());
        // The sender lives as long as `self`, so the channel cannot close here
        result.unwrap_or_else(|_| self.snapshot())
    }

    fn upload_token(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.upload_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a file and start following the resulting job.
    ///
    /// Returns once the submit call has resolved; the job itself is
    /// followed in the background. Use `wait_idle` to wait for its outcome.
    pub async fn submit(&self, file: MediaFile) -> Result<SubmitOutcome, UploadError> {
        let upload = self.shared.update(|s, events| {
            s.begin_upload()?;
            events.on_phase_change(UploadPhase::Uploading);
            events.on_progress(Progress::ZERO);
            Ok::<_, InvalidStateTransition>(self.shared.uploads.fetch_add(1, Ordering::AcqRel) + 1)
        })?;

        tracing::info!(
            file = file.name(),
            size = %file.human_readable_size(),
            media_type = %file.media_type(),
            "uploading recording"
        );

        let token = CancellationToken::new();
        *self.upload_token() = Some(token.clone());
        self.start_progress(upload);

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.transport.submit(&file) => Some(result),
        };

        self.progress.stop();
        self.upload_token().take();

        match result {
            None => Ok(SubmitOutcome::Cancelled),
            Some(Ok(receipt)) => Ok(self.accept(receipt)),
            Some(Err(error)) => {
                tracing::error!(error = %error, "upload failed");
                let reason = error.to_string();
                let error = UploadError::Transport(error);
                let reported = self.shared.update(|s, events| {
                    s.fail_upload(reason)?;
                    events.on_progress(Progress::ZERO);
                    events.on_phase_change(UploadPhase::Idle);
                    events.on_error(&error.to_string());
                    Ok::<_, InvalidStateTransition>(())
                });
                match reported {
                    Ok(()) => Err(error),
                    Err(_) => Ok(SubmitOutcome::Cancelled),
                }
            }
        }
    }

    /// Tick synthetic progress for one upload. Ticks that arrive after that
    /// upload resolved or was replaced are dropped.
    fn start_progress(&self, upload: u64) {
        let shared = Arc::clone(&self.shared);
        self.progress.start(move |step, ceiling| {
            shared.update(|s, events| {
                if shared.current_upload() != upload {
                    return false;
                }
                match s.advance_progress(step, ceiling) {
                    Some(progress) => {
                        events.on_progress(progress);
                        true
                    }
                    None => false,
                }
            })
        });
    }

    /// Handle a successful submit
    fn accept(&self, receipt: JobReceipt) -> SubmitOutcome {
        let job_id = receipt.into_job_id();

        // Starting the poller under the session lock keeps a concurrent
        // cancel from slipping between the phase change and the start
        let accepted = self.shared.update(|s, events| {
            s.finish_upload(job_id.clone())?;
            events.on_progress(Progress::COMPLETE);
            match job_id {
                Some(ref id) => {
                    self.poller.start(id.clone(), self.poll_callbacks(id));
                    events.on_phase_change(UploadPhase::Polling);
                    events.on_info(PROCESSING_NOTICE);
                }
                None => events.on_phase_change(UploadPhase::Idle),
            }
            Ok::<_, InvalidStateTransition>(())
        });
        if accepted.is_err() {
            return SubmitOutcome::Cancelled;
        }

        match job_id {
            Some(id) => {
                tracing::info!(job_id = %id, "upload accepted, polling for status");
                SubmitOutcome::Polling(id)
            }
            None => {
                tracing::info!("upload accepted without a job id");
                SubmitOutcome::Accepted
            }
        }
    }

    fn poll_callbacks(&self, job_id: &JobId) -> PollCallbacks {
        let on_update = {
            let shared = Arc::clone(&self.shared);
            let job_id = job_id.clone();
            move |status: &JobStatus| {
                shared.while_polling(&job_id, |events| events.on_status(status));
            }
        };

        let on_complete = {
            let shared = Arc::clone(&self.shared);
            let job_id = job_id.clone();
            move |transcript: String, minutes: String| {
                let resolved = Minutes::resolve(transcript, minutes);
                let _ = shared.update(|s, events| {
                    s.finish_job(&job_id, JobOutcome::Completed(resolved.clone()))?;
                    if resolved.used_fallback {
                        tracing::warn!(job_id = %job_id, "no minutes returned, falling back to transcript");
                        events.on_warning(FALLBACK_WARNING);
                    }
                    events.on_complete(&resolved.transcript, &resolved.minutes);
                    events.on_phase_change(UploadPhase::Idle);
                    Ok::<_, InvalidStateTransition>(())
                });
            }
        };

        let on_error = {
            let shared = Arc::clone(&self.shared);
            let job_id = job_id.clone();
            move |failure: PollFailure| {
                let message = failure.to_string();
                let _ = shared.update(|s, events| {
                    s.finish_job(&job_id, JobOutcome::Failed(message.clone()))?;
                    events.on_error(&message);
                    events.on_phase_change(UploadPhase::Idle);
                    Ok::<_, InvalidStateTransition>(())
                });
            }
        };

        PollCallbacks {
            on_update: Some(Box::new(on_update)),
            on_complete: Some(Box::new(on_complete)),
            on_error: Some(Box::new(on_error)),
            on_transient: None,
        }
    }

    /// Abandon the active upload or poll.
    ///
    /// Clears both timers; no callbacks for the abandoned job fire after
    /// this returns. Returns `false` when there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.update(|s, events| {
            let was_uploading = s.phase() == UploadPhase::Uploading;
            let job_id = s.cancel()?;
            if was_uploading {
                events.on_progress(Progress::ZERO);
            }
            events.on_phase_change(UploadPhase::Idle);
            Ok::<_, InvalidStateTransition>(job_id)
        });

        let Ok(job_id) = cancelled else {
            return false;
        };

        self.progress.stop();
        if let Some(token) = self.upload_token().take() {
            token.cancel();
        }
        if let Some(ref id) = job_id {
            self.poller.cancel(id);
        }

        tracing::info!(job_id = ?job_id.as_ref().map(JobId::as_str), "cancelled");
        true
    }

    /// Whether a poll loop is live for the given job
    pub fn is_polling(&self, job_id: &JobId) -> bool {
        self.poller.is_polling(job_id)
    }
}

impl<T, E> Drop for UploadOrchestrator<T, E>
where
    T: JobTransport + 'static,
    E: UploadEvents + 'static,
{
    fn drop(&mut self) {
        self.progress.stop();
        if let Some(token) = self.upload_token().take() {
            token.cancel();
        }
        self.poller.cancel_all();
    }
}
