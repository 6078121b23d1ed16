use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt` into image bytes (PNG).
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageGeneratorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGeneratorError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
