//! Job status poller
//!
//! Drives a submitted job to a terminal outcome by requesting its status on
//! a fixed interval. Each active job owns exactly one background task; the
//! task is released on the first terminal status, on `cancel`, or when the
//! poller is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::domain::duration::Duration;
use crate::domain::error::{JobError, ProtocolError};
use crate::domain::job::{Job, JobId, JobSnapshot, JobStatus};

use super::ports::{JobTransport, TransportError};

/// Why a job ended without minutes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollFailure {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Processing failed: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Lost contact with the transcription service after {attempts} attempts: {last}")]
    Unreachable { attempts: u32, last: TransportError },
}

/// Callbacks for a single poll loop.
///
/// `on_update` fires for every in-progress status. Exactly one of
/// `on_complete` or `on_error` fires, and only if the loop is not cancelled.
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct PollCallbacks {
    /// Called with each in-progress status
    pub on_update: Option<Box<dyn Fn(&JobStatus) + Send + Sync>>,
    /// Called with (transcript, minutes) once the job completes
    pub on_complete: Option<Box<dyn FnOnce(String, String) + Send + Sync>>,
    /// Called once the job fails
    pub on_error: Option<Box<dyn FnOnce(PollFailure) + Send + Sync>>,
    /// Called with (error, consecutive failures) when a status request fails
    pub on_transient: Option<Box<dyn Fn(&TransportError, u32) + Send + Sync>>,
}

/// Poll loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between status requests
    pub interval: StdDuration,
    /// Stop after this many consecutive transport failures; `None` retries forever
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::default_poll_interval().as_std(),
            max_consecutive_failures: None,
        }
    }
}

/// What a single poll response means for the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Job still running; keep polling
    InProgress(JobStatus),
    /// Status request failed; keep polling
    Transient {
        error: TransportError,
        consecutive: u32,
    },
    /// Job finished with a transcript; minutes default to empty
    Completed { transcript: String, minutes: String },
    /// Job finished without a usable result
    Failed(PollFailure),
}

impl PollStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed(_))
    }
}

/// Per-job poll state. `advance` is the whole decision logic of a tick and
/// performs no I/O.
#[derive(Debug, Clone)]
pub struct PollState {
    job: Job,
    consecutive_failures: u32,
    max_failures: Option<u32>,
}

impl PollState {
    pub fn new(job_id: JobId, max_failures: Option<u32>) -> Self {
        Self {
            job: Job::new(job_id),
            consecutive_failures: 0,
            max_failures,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fold one status response into the state
    pub fn advance(&mut self, response: Result<JobSnapshot, TransportError>) -> PollStep {
        let snapshot = match response {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let attempts = self.consecutive_failures;
                if self.max_failures.is_some_and(|max| attempts >= max) {
                    return PollStep::Failed(PollFailure::Unreachable {
                        attempts,
                        last: error,
                    });
                }
                return PollStep::Transient {
                    error,
                    consecutive: attempts,
                };
            }
        };

        self.consecutive_failures = 0;
        self.job.apply(snapshot);

        match self.job.status() {
            JobStatus::Completed => match self.job.transcript().filter(|t| !t.is_empty()) {
                Some(transcript) => PollStep::Completed {
                    transcript: transcript.to_string(),
                    minutes: self.job.minutes().unwrap_or_default().to_string(),
                },
                None => PollStep::Failed(
                    ProtocolError::MissingTranscript {
                        job_id: self.job.id().clone(),
                    }
                    .into(),
                ),
            },
            JobStatus::Error => PollStep::Failed(
                JobError::from_server(self.job.error().map(str::to_string)).into(),
            ),
            in_progress => PollStep::InProgress(in_progress.clone()),
        }
    }
}

struct ActivePoll {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ActivePoll {
    fn release(self) {
        self.token.cancel();
        self.task.abort();
    }
}

type ActiveMap = Arc<Mutex<HashMap<JobId, ActivePoll>>>;

fn lock(active: &ActiveMap) -> MutexGuard<'_, HashMap<JobId, ActivePoll>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls job status until each job reaches a terminal state.
///
/// Must be used from within a Tokio runtime.
pub struct JobPoller<T: JobTransport + 'static> {
    transport: Arc<T>,
    config: PollerConfig,
    active: ActiveMap,
    next_generation: AtomicU64,
}

impl<T: JobTransport + 'static> JobPoller<T> {
    /// Create a poller using the given transport
    pub fn new(transport: Arc<T>, config: PollerConfig) -> Self {
        Self {
            transport,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Start polling a job.
    ///
    /// The first status request goes out one interval after this call.
    /// Returns `false` without touching the running loop if the job is
    /// already being polled.
    pub fn start(&self, job_id: JobId, callbacks: PollCallbacks) -> bool {
        let mut active = lock(&self.active);
        if active.contains_key(&job_id) {
            tracing::debug!(job_id = %job_id, "poll already active");
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let first_tick = Instant::now() + self.config.interval;
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.transport),
            job_id.clone(),
            self.config,
            first_tick,
            callbacks,
            token.clone(),
            Arc::clone(&self.active),
            generation,
        ));

        tracing::info!(job_id = %job_id, interval_ms = self.config.interval.as_millis() as u64, "polling started");
        active.insert(
            job_id,
            ActivePoll {
                generation,
                token,
                task,
            },
        );
        true
    }

    /// Stop polling a job. Safe to call repeatedly or for unknown jobs.
    /// Returns `true` if a live loop was stopped.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        let removed = lock(&self.active).remove(job_id);
        match removed {
            Some(poll) => {
                poll.release();
                tracing::info!(job_id = %job_id, "polling cancelled");
                true
            }
            None => false,
        }
    }

    /// Stop every active loop
    pub fn cancel_all(&self) {
        let drained: Vec<(JobId, ActivePoll)> = lock(&self.active).drain().collect();
        for (job_id, poll) in drained {
            poll.release();
            tracing::debug!(job_id = %job_id, "polling cancelled on teardown");
        }
    }

    pub fn is_polling(&self, job_id: &JobId) -> bool {
        lock(&self.active).contains_key(job_id)
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        lock(&self.active).keys().cloned().collect()
    }
}

impl<T: JobTransport + 'static> Drop for JobPoller<T> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Remove this loop's registration, unless a newer loop replaced it.
/// Returns `false` when the loop no longer owned its slot, meaning it was
/// cancelled while its last request was in flight.
fn deregister(active: &ActiveMap, job_id: &JobId, generation: u64) -> bool {
    let mut active = lock(active);
    if active.get(job_id).map(|p| p.generation) == Some(generation) {
        active.remove(job_id);
        true
    } else {
        false
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop<T: JobTransport + 'static>(
    transport: Arc<T>,
    job_id: JobId,
    config: PollerConfig,
    first_tick: Instant,
    mut callbacks: PollCallbacks,
    token: CancellationToken,
    active: ActiveMap,
    generation: u64,
) {
    let mut state = PollState::new(job_id.clone(), config.max_consecutive_failures);
    let mut ticker = time::interval_at(first_tick, config.interval);
    // A slow response pushes the next tick back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            response = async {
                ticker.tick().await;
                transport.get_status(&job_id).await
            } => response,
        };

        if token.is_cancelled() {
            return;
        }

        let step = state.advance(response);
        if step.is_terminal() && !deregister(&active, &job_id, generation) {
            tracing::debug!(job_id = %job_id, "poll cancelled before its outcome was delivered");
            return;
        }

        match step {
            PollStep::InProgress(status) => {
                tracing::debug!(job_id = %job_id, status = %status, "job in progress");
                if let Some(ref cb) = callbacks.on_update {
                    cb(&status);
                }
            }
            PollStep::Transient { error, consecutive } => {
                tracing::warn!(
                    job_id = %job_id,
                    attempt = consecutive,
                    error = %error,
                    "status check failed, retrying on next tick"
                );
                if let Some(ref cb) = callbacks.on_transient {
                    cb(&error, consecutive);
                }
            }
            PollStep::Completed {
                transcript,
                minutes,
            } => {
                tracing::info!(job_id = %job_id, "job completed");
                if let Some(cb) = callbacks.on_complete.take() {
                    cb(transcript, minutes);
                }
                return;
            }
            PollStep::Failed(failure) => {
                tracing::warn!(job_id = %job_id, error = %failure, "job failed");
                if let Some(cb) = callbacks.on_error.take() {
                    cb(failure);
                }
                return;
            }
        }
    }
}
