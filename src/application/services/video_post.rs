use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::{MediaProcessor, MediaProcessorError};

/// Video post-processing: subtitle burn-in and image-to-video with a
/// slow zoom. Thin orchestration over the media tool.
pub struct VideoPostService<M: MediaProcessor> {
    media: Arc<M>,
    output_dir: PathBuf,
}

impl<M: MediaProcessor> VideoPostService<M> {
    pub fn new(media: Arc<M>, output_dir: PathBuf) -> Self {
        Self { media, output_dir }
    }

    pub async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
    ) -> Result<PathBuf, VideoPostError> {
        if !video.exists() {
            return Err(VideoPostError::MissingInput(video.display().to_string()));
        }
        if !subtitles.exists() {
            return Err(VideoPostError::MissingInput(subtitles.display().to_string()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_dir.join(format!("{}.mp4", Uuid::new_v4()));
        self.media.burn_subtitles(video, subtitles, &output).await?;

        tracing::info!(output = %output.display(), "Subtitles burned in");
        Ok(output)
    }

    pub async fn image_to_video(
        &self,
        image: &Path,
        duration_secs: f64,
        zoom: f64,
    ) -> Result<PathBuf, VideoPostError> {
        if !image.exists() {
            return Err(VideoPostError::MissingInput(image.display().to_string()));
        }
        if duration_secs <= 0.0 {
            return Err(VideoPostError::InvalidParameter(format!(
                "duration must be positive, got {}",
                duration_secs
            )));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_dir.join(format!("{}.mp4", Uuid::new_v4()));
        self.media
            .image_to_video(image, &output, duration_secs, zoom.max(1.0))
            .await?;

        tracing::info!(output = %output.display(), "Image rendered to video");
        Ok(output)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoPostError {
    #[error("input not found: {0}")]
    MissingInput(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("media processing: {0}")]
    Media(#[from] MediaProcessorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
