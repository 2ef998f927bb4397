//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod duration;
pub mod error;
pub mod job;
pub mod media;
pub mod session;

// Re-export common types
pub use config::AppConfig;
pub use duration::Duration;
pub use error::*;
pub use job::{Job, JobId, JobReceipt, JobSnapshot, JobStatus, Minutes};
pub use media::{MediaFile, MediaType};
pub use session::{JobOutcome, Progress, SessionSnapshot, UploadPhase, UploadSession};
