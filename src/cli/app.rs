//! Main app runner for one-shot uploads

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::application::ports::{ConfigStore, NotificationIcon, Notifier};
use crate::application::{
    OrchestratorConfig, PollerConfig, ProgressConfig, SubmitOutcome, UploadOrchestrator,
};
use crate::domain::config::AppConfig;
use crate::domain::duration::Duration;
use crate::domain::job::Minutes;
use crate::domain::media::MediaFile;
use crate::domain::session::JobOutcome;
use crate::infrastructure::{create_notifier, HttpJobTransport, XdgConfigStore};

use super::args::Cli;
use super::config_cmd::parse_api_url;
use super::console::{ConsoleEvents, COMPLETE_MESSAGE};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_CANCELLED: u8 = 130;

/// Environment variable overriding the service URL
pub const API_URL_ENV: &str = "MEETING_MINUTES_API_URL";

/// Notification title
const NOTIFY_TITLE: &str = "Meeting Minutes";

/// Fully resolved options for one upload
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub file: PathBuf,
    pub api_url: String,
    pub poll_interval: Duration,
    pub max_poll_failures: Option<u32>,
    pub request_timeout: Option<Duration>,
    /// Where the minutes go; stdout when unset
    pub output: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub notify: bool,
}

impl UploadOptions {
    /// Resolve options from parsed flags and the merged config.
    ///
    /// Invalid values are reported rather than silently replaced by defaults.
    pub fn resolve(cli: &Cli, config: &AppConfig) -> Result<Self, String> {
        let file = cli
            .file
            .clone()
            .ok_or_else(|| "No recording given. Usage: meeting-minutes <FILE>".to_string())?;

        let api_url = parse_api_url(config.api_url_or_default())
            .map_err(|e| format!("Invalid api_url: {}", e))?;

        let poll_interval = match config.poll_interval.as_deref() {
            Some(s) => s
                .parse::<Duration>()
                .map_err(|e| format!("Invalid poll interval: {}", e))?,
            None => Duration::default_poll_interval(),
        };

        let request_timeout = config
            .request_timeout
            .as_deref()
            .map(|s| s.parse::<Duration>())
            .transpose()
            .map_err(|e| format!("Invalid request timeout: {}", e))?;

        let output = cli.output.clone().or_else(|| {
            config
                .output_dir
                .as_deref()
                .map(|dir| default_output_path(Path::new(dir), &file))
        });

        Ok(Self {
            api_url,
            poll_interval,
            max_poll_failures: config.max_poll_failures(),
            request_timeout,
            output,
            transcript: cli.transcript.clone(),
            notify: config.notify_or_default(),
            file,
        })
    }

    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll: PollerConfig {
                interval: self.poll_interval.as_std(),
                max_consecutive_failures: self.max_poll_failures,
            },
            progress: ProgressConfig::default(),
        }
    }
}

/// `<output_dir>/<recording stem>.md`
fn default_output_path(dir: &Path, file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "minutes".to_string());
    dir.join(format!("{}.md", stem))
}

/// Run a one-shot upload from parsed flags
pub async fn run_oneshot(cli: Cli) -> ExitCode {
    let presenter = Arc::new(Presenter::new());
    let config = load_merged_config(cli.config_overrides()).await;

    let options = match UploadOptions::resolve(&cli, &config) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    ExitCode::from(run_upload(options, presenter, &shutdown).await)
}

/// Upload one recording and deliver its minutes. Returns the exit code.
pub async fn run_upload(
    options: UploadOptions,
    presenter: Arc<Presenter>,
    shutdown: &ShutdownSignal,
) -> u8 {
    let file = match MediaFile::from_path(&options.file).await {
        Ok(file) => file,
        Err(e) => {
            presenter.error(&e.to_string());
            return EXIT_USAGE_ERROR;
        }
    };

    let transport = match options.request_timeout {
        Some(timeout) => match HttpJobTransport::with_timeout(&options.api_url, timeout.as_std()) {
            Ok(transport) => transport,
            Err(e) => {
                presenter.error(&e.to_string());
                return EXIT_ERROR;
            }
        },
        None => HttpJobTransport::new(&options.api_url),
    };

    tracing::info!(api_url = %options.api_url, poll_interval = %options.poll_interval, "starting upload");
    let events = ConsoleEvents::new(Arc::clone(&presenter), file.name());
    let orchestrator = UploadOrchestrator::new(transport, events, options.orchestrator_config());

    let run = async {
        match orchestrator.submit(file).await {
            Ok(SubmitOutcome::Polling(_)) => orchestrator.wait_idle().await.outcome,
            Ok(SubmitOutcome::Accepted) => Some(JobOutcome::Accepted),
            Ok(SubmitOutcome::Cancelled) => Some(JobOutcome::Cancelled),
            Err(e) => Some(JobOutcome::Failed(e.to_string())),
        }
    };

    let outcome = tokio::select! {
        outcome = run => outcome,
        _ = shutdown.cancelled() => {
            orchestrator.cancel();
            Some(JobOutcome::Cancelled)
        }
    };

    match outcome {
        Some(JobOutcome::Completed(minutes)) => {
            if let Err(e) = deliver(&options, &minutes, &presenter).await {
                presenter.error(&e);
                return EXIT_ERROR;
            }
            if options.notify {
                notify(NOTIFY_TITLE, COMPLETE_MESSAGE, NotificationIcon::Success).await;
            }
            EXIT_SUCCESS
        }
        Some(JobOutcome::Accepted) => {
            presenter.success("Recording accepted. The server did not return a job to follow.");
            EXIT_SUCCESS
        }
        Some(JobOutcome::Cancelled) => {
            presenter.clear();
            presenter.warn("Cancelled");
            EXIT_CANCELLED
        }
        Some(JobOutcome::Failed(message)) => {
            if options.notify {
                notify(NOTIFY_TITLE, &message, NotificationIcon::Error).await;
            }
            EXIT_ERROR
        }
        None => EXIT_ERROR,
    }
}

/// Write the minutes (and optionally the transcript) to their destinations
async fn deliver(options: &UploadOptions, minutes: &Minutes, presenter: &Presenter) -> Result<(), String> {
    if let Some(ref path) = options.transcript {
        write_file(path, &minutes.transcript).await?;
        presenter.info(&format!("Transcript written to {}", path.display()));
    }

    match options.output {
        Some(ref path) => {
            write_file(path, &minutes.minutes).await?;
            presenter.success(&format!("Minutes written to {}", path.display()));
        }
        None => presenter.output(&minutes.minutes),
    }
    Ok(())
}

async fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Show a desktop notification; failures are only logged
async fn notify(title: &str, message: &str, icon: NotificationIcon) {
    if let Err(e) = create_notifier().notify(title, message, icon).await {
        tracing::warn!(error = %e, "desktop notification failed");
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %store.path().display(), error = %e, "ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        api_url: env::var(API_URL_ENV).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
