//! Job transport port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::{JobId, JobReceipt, JobSnapshot};
use crate::domain::media::MediaFile;

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Port for the remote transcription service.
///
/// Implementations are stateless boundary calls: no retries and no caching.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Submit a media file for processing.
    ///
    /// # Returns
    /// The server's receipt, which may or may not carry a job identifier
    async fn submit(&self, file: &MediaFile) -> Result<JobReceipt, TransportError>;

    /// Fetch the current state of a job.
    async fn get_status(&self, job_id: &JobId) -> Result<JobSnapshot, TransportError>;
}
