use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::SilenceSpan;

/// Codec metadata for a media file.
#[derive(Debug, Clone, Copy)]
pub struct MediaProbe {
    /// Container duration in seconds.
    pub duration: f64,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Boundary to the external media tool. All operations are file-to-file;
/// callers own the paths and their lifetimes.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Apply a tempo change of `factor` to `input`, writing an
    /// uncompressed PCM file at `output`.
    async fn accelerate(
        &self,
        input: &Path,
        output: &Path,
        factor: f64,
    ) -> Result<(), MediaProcessorError>;

    async fn probe(&self, path: &Path) -> Result<MediaProbe, MediaProcessorError>;

    /// Cut `[start, start + duration)` seconds out of `input` into an
    /// encoded chunk at `output`.
    async fn cut(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        duration: f64,
    ) -> Result<(), MediaProcessorError>;

    /// Detect silence intervals at or below `threshold_db` lasting at
    /// least `min_duration` seconds.
    async fn detect_silence(
        &self,
        input: &Path,
        threshold_db: f64,
        min_duration: f64,
    ) -> Result<Vec<SilenceSpan>, MediaProcessorError>;

    /// Render `subtitles` onto `video`.
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<(), MediaProcessorError>;

    /// Turn a still image into a video clip with a slow zoom.
    async fn image_to_video(
        &self,
        image: &Path,
        output: &Path,
        duration: f64,
        zoom: f64,
    ) -> Result<(), MediaProcessorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaProcessorError {
    #[error("media tool failed: {0}")]
    ToolFailed(String),
    #[error("probe failed: {0}")]
    ProbeFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
