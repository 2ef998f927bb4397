//! End-to-end upload and poll runs against a mock service

use std::sync::{Arc, Mutex};
use std::time::Duration;

use meeting_minutes::application::ports::UploadEvents;
use meeting_minutes::application::{
    OrchestratorConfig, PollerConfig, ProgressConfig, SubmitOutcome, UploadError,
    UploadOrchestrator, FALLBACK_WARNING,
};
use meeting_minutes::domain::job::{JobId, JobStatus};
use meeting_minutes::domain::media::MediaFile;
use meeting_minutes::domain::session::{JobOutcome, Progress, SessionSnapshot, UploadPhase};
use meeting_minutes::infrastructure::HttpJobTransport;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(10);

#[derive(Default)]
struct Recorder {
    completions: Mutex<Vec<(String, String)>>,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    statuses: Mutex<Vec<JobStatus>>,
    progress: Mutex<Vec<u8>>,
}

impl UploadEvents for Recorder {
    fn on_progress(&self, progress: Progress) {
        self.progress.lock().unwrap().push(progress.percent());
    }
    fn on_phase_change(&self, _phase: UploadPhase) {}
    fn on_complete(&self, transcript: &str, minutes: &str) {
        self.completions
            .lock()
            .unwrap()
            .push((transcript.to_string(), minutes.to_string()));
    }
    fn on_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
    fn on_status(&self, status: &JobStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}

fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        poll: PollerConfig {
            interval: Duration::from_millis(50),
            max_consecutive_failures: None,
        },
        progress: ProgressConfig::default(),
    }
}

fn recording() -> MediaFile {
    MediaFile::new("weekly.webm", vec![7u8; 256]).unwrap()
}

async fn mount_upload(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": job_id, "status": "queued"})),
        )
        .mount(server)
        .await;
}

/// Serve `response` for the next `times` status requests of `job_id`
async fn mount_status(server: &MockServer, job_id: &str, times: u64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/status/{}", job_id)))
        .respond_with(response)
        .up_to_n_times(times)
        .mount(server)
        .await;
}

fn status(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn orchestrator(
    server: &MockServer,
) -> (UploadOrchestrator<HttpJobTransport, Recorder>, Arc<Recorder>) {
    let events = Arc::new(Recorder::default());
    let orchestrator = UploadOrchestrator::with_shared(
        Arc::new(HttpJobTransport::new(server.uri())),
        Arc::clone(&events),
        config(),
    );
    (orchestrator, events)
}

async fn finish(orchestrator: &UploadOrchestrator<HttpJobTransport, Recorder>) -> SessionSnapshot {
    tokio::time::timeout(WAIT, orchestrator.wait_idle())
        .await
        .expect("job did not finish in time")
}

async fn status_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with("/status/"))
        .count()
}

#[tokio::test]
async fn happy_path_delivers_minutes() {
    let server = MockServer::start().await;
    mount_upload(&server, "j1").await;
    mount_status(&server, "j1", 1, status(json!({"job_id": "j1", "status": "queued"}))).await;
    mount_status(&server, "j1", 1, status(json!({"job_id": "j1", "status": "transcribing"}))).await;
    mount_status(
        &server,
        "j1",
        u64::MAX,
        status(json!({"job_id": "j1", "status": "completed", "transcript": "T", "minutes": "M"})),
    )
    .await;

    let (orchestrator, events) = orchestrator(&server);
    let outcome = orchestrator.submit(recording()).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Polling(JobId::new("j1")));

    let finished = finish(&orchestrator).await;
    assert!(matches!(finished.outcome, Some(JobOutcome::Completed(_))));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        *events.completions.lock().unwrap(),
        vec![("T".to_string(), "M".to_string())]
    );
    assert!(events.errors.lock().unwrap().is_empty());
    assert_eq!(
        *events.statuses.lock().unwrap(),
        vec![JobStatus::Queued, JobStatus::Transcribing]
    );
    assert_eq!(status_requests(&server).await, 3);
    assert_eq!(events.progress.lock().unwrap().last(), Some(&100));
}

#[tokio::test]
async fn completed_without_transcript_fails_once() {
    let server = MockServer::start().await;
    mount_upload(&server, "j2").await;
    mount_status(
        &server,
        "j2",
        u64::MAX,
        status(json!({"job_id": "j2", "status": "completed"})),
    )
    .await;

    let (orchestrator, events) = orchestrator(&server);
    orchestrator.submit(recording()).await.unwrap();
    let finished = finish(&orchestrator).await;

    assert!(matches!(finished.outcome, Some(JobOutcome::Failed(_))));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(events.errors.lock().unwrap().len(), 1);
    assert!(events.completions.lock().unwrap().is_empty());
    assert_eq!(status_requests(&server).await, 1);
}

#[tokio::test]
async fn transient_failure_then_fallback_to_transcript() {
    let server = MockServer::start().await;
    mount_upload(&server, "j3").await;
    mount_status(&server, "j3", 1, ResponseTemplate::new(503)).await;
    mount_status(&server, "j3", 1, status(json!({"job_id": "j3", "status": "transcribing"}))).await;
    mount_status(
        &server,
        "j3",
        u64::MAX,
        status(json!({"job_id": "j3", "status": "completed", "transcript": "T", "minutes": ""})),
    )
    .await;

    let (orchestrator, events) = orchestrator(&server);
    orchestrator.submit(recording()).await.unwrap();
    finish(&orchestrator).await;

    assert_eq!(
        *events.completions.lock().unwrap(),
        vec![("T".to_string(), "T".to_string())]
    );
    assert_eq!(
        *events.warnings.lock().unwrap(),
        vec![FALLBACK_WARNING.to_string()]
    );
    assert!(events.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn server_reported_error_surfaces_message() {
    let server = MockServer::start().await;
    mount_upload(&server, "j4").await;
    mount_status(
        &server,
        "j4",
        u64::MAX,
        status(json!({"job_id": "j4", "status": "error", "error": "audio track missing"})),
    )
    .await;

    let (orchestrator, events) = orchestrator(&server);
    orchestrator.submit(recording()).await.unwrap();
    finish(&orchestrator).await;

    assert_eq!(
        *events.errors.lock().unwrap(),
        vec!["Processing failed: audio track missing".to_string()]
    );
}

#[tokio::test]
async fn upload_failure_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (orchestrator, events) = orchestrator(&server);
    let result = orchestrator.submit(recording()).await;

    assert!(matches!(result, Err(UploadError::Transport(_))));
    assert_eq!(orchestrator.phase(), UploadPhase::Idle);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(status_requests(&server).await, 0);

    let errors = events.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to upload recording"));
}

#[tokio::test]
async fn cancel_stops_status_requests() {
    let server = MockServer::start().await;
    mount_upload(&server, "j5").await;
    mount_status(
        &server,
        "j5",
        u64::MAX,
        status(json!({"job_id": "j5", "status": "transcribing"})),
    )
    .await;

    let (orchestrator, events) = orchestrator(&server);
    orchestrator.submit(recording()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(180)).await;

    assert!(orchestrator.cancel());
    let seen = status_requests(&server).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // A request already on the wire may still land, but nothing new is sent
    assert!(status_requests(&server).await <= seen + 1);
    assert!(events.completions.lock().unwrap().is_empty());
    assert!(events.errors.lock().unwrap().is_empty());
    assert_eq!(orchestrator.snapshot().outcome, Some(JobOutcome::Cancelled));
}

async fn run_binary(server: &MockServer, args: &[&str]) -> (Option<i32>, String, String) {
    let home = tempfile::TempDir::new().unwrap();
    let recording = home.path().join("standup.mp4");
    std::fs::write(&recording, b"fake video bytes").unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_meeting-minutes"))
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .env_remove("MEETING_MINUTES_API_URL")
        .args(["--api-url", &server.uri(), "--poll-interval", "50ms"])
        .args(args)
        .arg(&recording)
        .output()
        .await
        .expect("Failed to execute command");

    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[tokio::test]
async fn binary_prints_minutes_to_stdout() {
    let server = MockServer::start().await;
    mount_upload(&server, "b1").await;
    mount_status(&server, "b1", 1, status(json!({"job_id": "b1", "status": "transcribing"}))).await;
    mount_status(
        &server,
        "b1",
        u64::MAX,
        status(json!({
            "job_id": "b1",
            "status": "completed",
            "transcript": "raw words",
            "minutes": "# Weekly sync\n- ship it"
        })),
    )
    .await;

    let (code, stdout, _stderr) = run_binary(&server, &[]).await;

    assert_eq!(code, Some(0));
    assert!(stdout.contains("# Weekly sync"), "got: {}", stdout);
}

#[tokio::test]
async fn binary_writes_output_and_transcript_files() {
    let server = MockServer::start().await;
    mount_upload(&server, "b2").await;
    mount_status(
        &server,
        "b2",
        u64::MAX,
        status(json!({"job_id": "b2", "status": "completed", "transcript": "raw words"})),
    )
    .await;

    let out = tempfile::TempDir::new().unwrap();
    let minutes_path = out.path().join("minutes.md");
    let transcript_path = out.path().join("transcript.txt");
    let (code, stdout, stderr) = run_binary(
        &server,
        &[
            "-o",
            minutes_path.to_str().unwrap(),
            "--transcript",
            transcript_path.to_str().unwrap(),
        ],
    )
    .await;

    assert_eq!(code, Some(0), "stderr: {}", stderr);
    assert!(stdout.trim().is_empty());
    assert!(stderr.contains(FALLBACK_WARNING), "got: {}", stderr);
    assert_eq!(std::fs::read_to_string(&minutes_path).unwrap(), "raw words");
    assert_eq!(
        std::fs::read_to_string(&transcript_path).unwrap(),
        "raw words"
    );
}

#[tokio::test]
async fn binary_exits_with_error_when_job_fails() {
    let server = MockServer::start().await;
    mount_upload(&server, "b3").await;
    mount_status(
        &server,
        "b3",
        u64::MAX,
        status(json!({"job_id": "b3", "status": "error"})),
    )
    .await;

    let (code, stdout, stderr) = run_binary(&server, &[]).await;

    assert_eq!(code, Some(1));
    assert!(stdout.trim().is_empty());
    assert!(
        stderr.contains("Processing failed: Unknown error"),
        "got: {}",
        stderr
    );
}

#[tokio::test]
async fn binary_exits_with_error_when_upload_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (code, _stdout, stderr) = run_binary(&server, &[]).await;

    assert_eq!(code, Some(1));
    assert!(stderr.contains("Failed to upload recording"), "got: {}", stderr);
}

#[tokio::test]
async fn binary_gives_up_after_failure_ceiling() {
    let server = MockServer::start().await;
    mount_upload(&server, "b4").await;
    mount_status(&server, "b4", u64::MAX, ResponseTemplate::new(503)).await;

    let (code, _stdout, stderr) = run_binary(&server, &["--max-poll-failures", "3"]).await;

    assert_eq!(code, Some(1));
    assert!(stderr.contains("after 3 attempts"), "got: {}", stderr);
    assert_eq!(status_requests(&server).await, 3);
}
