//! Application layer - Use cases and port interfaces
//!
//! Contains the upload and polling workflows and the trait definitions
//! for external system interactions.

pub mod orchestrator;
pub mod poller;
pub mod ports;
pub mod progress;

// Re-export use cases
pub use orchestrator::{
    OrchestratorConfig, SubmitOutcome, UploadError, UploadOrchestrator, FALLBACK_WARNING,
    PROCESSING_NOTICE,
};
pub use poller::{JobPoller, PollCallbacks, PollFailure, PollState, PollStep, PollerConfig};
pub use progress::{ProgressConfig, ProgressSimulator};
