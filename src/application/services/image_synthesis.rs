use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::{
    ImageGenerator, ImageGeneratorError, LlmClient, LlmClientError,
};

const ENHANCE_SYSTEM_PROMPT: &str = "You rewrite short image descriptions into rich, concrete \
prompts for an image model. Keep the subject, add composition, lighting and style detail, and \
answer with the rewritten prompt only.";

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub enhanced_prompt: String,
}

/// Two-stage image pipeline: enhance the caller's prompt with the chat
/// model, then render it. Thin orchestration over the two ports.
pub struct ImageSynthesisService<L: LlmClient, G: ImageGenerator> {
    llm: Arc<L>,
    generator: Arc<G>,
    output_dir: PathBuf,
}

impl<L: LlmClient, G: ImageGenerator> ImageSynthesisService<L, G> {
    pub fn new(llm: Arc<L>, generator: Arc<G>, output_dir: PathBuf) -> Self {
        Self {
            llm,
            generator,
            output_dir,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageSynthesisError> {
        let enhanced = self.llm.complete(ENHANCE_SYSTEM_PROMPT, prompt).await?;
        tracing::debug!(chars = enhanced.len(), "Prompt enhanced");

        let bytes = self.generator.generate(&enhanced).await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{}.png", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Image generated");
        Ok(GeneratedImage {
            path,
            enhanced_prompt: enhanced,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageSynthesisError {
    #[error("prompt enhancement: {0}")]
    Enhancement(#[from] LlmClientError),
    #[error("image generation: {0}")]
    Generation(#[from] ImageGeneratorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
