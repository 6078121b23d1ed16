use async_trait::async_trait;

use crate::domain::{AudioChunk, ChunkResult};

/// The minimal capability the batch coordinator needs: submit one chunk,
/// get its terminal result. Failures are encoded in the result rather
/// than raised; the coordinator branches on `success` and
/// `permanent_failure`.
#[async_trait]
pub trait ChunkTranscriber: Send + Sync {
    async fn transcribe(&self, chunk: &AudioChunk) -> ChunkResult;
}
