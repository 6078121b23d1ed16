use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::StatusCode;

use crate::application::ports::{TranscriptionApi, TranscriptionApiError, VerboseTranscription};

/// Whisper-compatible transcription endpoint speaking multipart
/// verbose-JSON. The service enforces a 25 MiB payload cap; preflight for
/// that lives in the client service, not here.
pub struct WhisperApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl WhisperApiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranscriptionApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranscriptionApiError::Network(format!("client init: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
            timeout,
        })
    }
}

#[async_trait]
impl TranscriptionApi for WhisperApiClient {
    async fn transcribe_file(
        &self,
        path: &Path,
    ) -> Result<VerboseTranscription, TranscriptionApiError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TranscriptionApiError::InvalidRequest(format!("read chunk: {}", e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chunk.mp3".to_string());

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| TranscriptionApiError::InvalidRequest(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", file_part);

        tracing::debug!(model = %self.model, path = %path.display(), "Submitting chunk to transcription service");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionApiError::Timeout(self.timeout)
                } else {
                    TranscriptionApiError::Network(format!("request: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(match status {
                StatusCode::BAD_REQUEST => TranscriptionApiError::InvalidRequest(body),
                StatusCode::PAYLOAD_TOO_LARGE => TranscriptionApiError::PayloadTooLarge(body),
                _ => TranscriptionApiError::Upstream {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        let payload: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionApiError::MalformedResponse(e.to_string()))?;

        tracing::debug!(
            segments = payload.segments.len(),
            reported_duration = payload.duration,
            "Transcription response received"
        );

        Ok(payload)
    }
}
