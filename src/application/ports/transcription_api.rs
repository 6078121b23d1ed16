use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ServiceSegment;

/// The verbose-JSON payload returned by the transcription service.
/// Timestamps are accelerated-timeline seconds local to the submitted
/// file. Modeled as an explicit record, not a generic map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerboseTranscription {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub language: String,
    pub duration: f64,
    pub text: String,
    pub segments: Vec<VerboseSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerboseSegment {
    #[serde(default)]
    pub id: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl VerboseTranscription {
    pub fn service_segments(&self) -> Vec<ServiceSegment> {
        self.segments
            .iter()
            .map(|s| ServiceSegment {
                start: s.start,
                end: s.end,
                text: s.text.clone(),
            })
            .collect()
    }
}

/// Raw speech-to-text endpoint. One call, no retries; retry policy lives
/// in the client service layered on top.
#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    async fn transcribe_file(
        &self,
        path: &Path,
    ) -> Result<VerboseTranscription, TranscriptionApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("service error (status {status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TranscriptionApiError {
    /// Invalid-request and payload-too-large rejections are deterministic;
    /// everything else may clear up on another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TranscriptionApiError::InvalidRequest(_) | TranscriptionApiError::PayloadTooLarge(_)
        )
    }
}
