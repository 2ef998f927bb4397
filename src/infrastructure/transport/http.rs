//! HTTP job transport adapter

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::application::ports::{JobTransport, TransportError};
use crate::domain::job::{JobId, JobReceipt, JobSnapshot};
use crate::domain::media::MediaFile;

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// Transport for the transcription service REST API.
///
/// `POST {base}/upload` submits a file, `GET {base}/status/{job_id}` reads a job.
pub struct HttpJobTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpJobTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a transport with a per-request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: StdDuration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a transport around an existing client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url)
    }

    /// Job ids are opaque, so the id is escaped as a single path segment
    fn status_url(&self, job_id: &JobId) -> Result<reqwest::Url, TransportError> {
        let invalid = || TransportError::Request(format!("Invalid base URL: {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["status", job_id.as_str()]);
        Ok(url)
    }

    fn file_part(file: &MediaFile) -> Result<Part, TransportError> {
        Part::bytes(file.data().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type().as_str())
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    /// Map a response to its decoded body, or to the failure class it belongs to
    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match body.trim() {
                "" => status.canonical_reason().unwrap_or("Unknown error").to_string(),
                text => text.to_string(),
            };
            return Err(TransportError::Http {
                status: status.as_u16(),
                reason,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JobTransport for HttpJobTransport {
    async fn submit(&self, file: &MediaFile) -> Result<JobReceipt, TransportError> {
        let form = Form::new().part(FILE_FIELD, Self::file_part(file)?);

        tracing::debug!(url = %self.upload_url(), file = file.name(), "POST upload");
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Self::decode(response).await
    }

    async fn get_status(&self, job_id: &JobId) -> Result<JobSnapshot, TransportError> {
        let response = self
            .client
            .get(self.status_url(job_id)?)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Self::decode(response).await
    }
}
