use super::{AudioChunk, ServiceSegment};

/// Outcome of one chunk's attempt sequence against the transcription
/// service. Carries the chunk snapshot so downstream stitching can reason
/// about failed spans on the original timeline.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub index: usize,
    pub chunk: AudioChunk,
    pub success: bool,
    pub segments: Vec<ServiceSegment>,
    pub error: Option<String>,
    pub retries: u32,
    /// Audio duration reported by the service (accelerated seconds).
    pub reported_duration: f64,
    /// Set when the failure is non-retryable (e.g. payload rejected);
    /// the batch-level retry loop skips these.
    pub permanent_failure: bool,
}

impl ChunkResult {
    pub fn succeeded(
        chunk: AudioChunk,
        segments: Vec<ServiceSegment>,
        reported_duration: f64,
        retries: u32,
    ) -> Self {
        Self {
            index: chunk.index,
            chunk,
            success: true,
            segments,
            error: None,
            retries,
            reported_duration,
            permanent_failure: false,
        }
    }

    pub fn failed(chunk: AudioChunk, error: String, retries: u32, permanent: bool) -> Self {
        Self {
            index: chunk.index,
            chunk,
            success: false,
            segments: Vec::new(),
            error: Some(error),
            retries,
            reported_duration: 0.0,
            permanent_failure: permanent,
        }
    }
}
