use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ImageGenerator, ImageGeneratorError};

/// Images endpoint client; requests base64 payloads and decodes them.
pub struct OpenAiImageClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: String,
}

impl OpenAiImageClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ImageGeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageGeneratorError::ApiRequestFailed(format!("client init: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model,
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageGeneratorError> {
        let url = format!("{}/images/generations", self.base_url);
        let body = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGeneratorError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ImageGeneratorError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ImageGeneratorError::MalformedResponse(e.to_string()))?;

        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageGeneratorError::MalformedResponse("empty data".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(datum.b64_json)
            .map_err(|e| ImageGeneratorError::MalformedResponse(format!("base64: {}", e)))
    }
}
