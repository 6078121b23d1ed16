mod chunk_transcriber;
mod image_generator;
mod llm_client;
mod media_processor;
mod transcription_api;

pub use chunk_transcriber::ChunkTranscriber;
pub use image_generator::{ImageGenerator, ImageGeneratorError};
pub use llm_client::{LlmClient, LlmClientError};
pub use media_processor::{MediaProbe, MediaProcessor, MediaProcessorError};
pub use transcription_api::{
    TranscriptionApi, TranscriptionApiError, VerboseSegment, VerboseTranscription,
};
