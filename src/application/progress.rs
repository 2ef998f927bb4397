//! Synthetic upload progress
//!
//! The transport exposes no byte-level progress, so the displayed percentage
//! is advanced on a timer while the submit call is in flight.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::domain::duration::Duration;

/// Progress simulation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Time between increments
    pub tick: StdDuration,
    /// Percentage added per tick
    pub step: u8,
    /// Highest value reached before the upload resolves
    pub ceiling: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: Duration::progress_tick().as_std(),
            step: 10,
            ceiling: 90,
        }
    }
}

/// Owns the timer task that drives synthetic progress.
///
/// At most one timer runs at a time; `stop` releases it synchronously.
#[derive(Default)]
pub struct ProgressSimulator {
    config: ProgressConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressSimulator {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> ProgressConfig {
        self.config
    }

    fn handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start ticking, replacing any running timer.
    ///
    /// `on_tick` is called once per tick with the configured step and
    /// ceiling; the timer ends when it returns `false`.
    pub fn start<F>(&self, mut on_tick: F)
    where
        F: FnMut(u8, u8) -> bool + Send + 'static,
    {
        let ProgressConfig {
            tick,
            step,
            ceiling,
        } = self.config;

        let mut handle = self.handle();
        if let Some(previous) = handle.take() {
            previous.abort();
        }

        let first_tick = Instant::now() + tick;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, tick);
            loop {
                ticker.tick().await;
                if !on_tick(step, ceiling) {
                    break;
                }
            }
        }));
    }

    /// Stop the timer. Returns `true` if one was still running.
    pub fn stop(&self) -> bool {
        match self.handle().take() {
            Some(task) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle().as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
