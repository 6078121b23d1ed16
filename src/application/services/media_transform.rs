use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{MediaProcessor, MediaProcessorError};

/// Accelerated working copy of the source plus the source metadata the
/// chunk planner needs.
#[derive(Debug, Clone)]
pub struct AcceleratedAudio {
    pub accelerated_duration: f64,
    pub original_duration: f64,
    pub original_bytes: u64,
}

/// Phase 1: produce the lossless accelerated master and validate it
/// against the source metadata. Downstream chunk cuts are sample-accurate
/// on this file; per-chunk re-encoding is lossy, the master is not.
pub struct MediaTransformService<M: MediaProcessor> {
    media: Arc<M>,
}

const DURATION_TOLERANCE: f64 = 0.05;
const DUPLICATION_RATIO: f64 = 1.9;
const CORRUPTION_RATIO: f64 = 0.5;
const LONG_SOURCE_SECS: f64 = 2.0 * 3600.0;
const LOOP_PERIOD_SECS: f64 = 1800.0;
const LOOP_REMAINDER_SECS: f64 = 60.0;

impl<M: MediaProcessor> MediaTransformService<M> {
    pub fn new(media: Arc<M>) -> Self {
        Self { media }
    }

    pub async fn process_audio(
        &self,
        input: &Path,
        output: &Path,
        factor: f64,
    ) -> Result<(AcceleratedAudio, Vec<String>), MediaTransformError> {
        let source = self.media.probe(input).await?;
        let warnings = source_warnings(source.duration);

        tracing::debug!(
            duration = source.duration,
            bytes = source.size_bytes,
            factor,
            "Accelerating source audio"
        );

        self.media.accelerate(input, output, factor).await?;

        let accelerated = self.media.probe(output).await?;
        let expected = source.duration / factor;
        validate_accelerated(accelerated.duration, accelerated.size_bytes, expected)?;

        Ok((
            AcceleratedAudio {
                accelerated_duration: accelerated.duration,
                original_duration: source.duration,
                original_bytes: source.size_bytes,
            },
            warnings,
        ))
    }
}

fn source_warnings(duration: f64) -> Vec<String> {
    let mut warnings = Vec::new();
    if duration > LONG_SOURCE_SECS {
        warnings.push(format!(
            "source duration {:.0}s exceeds 2 hours; expect a long-running job",
            duration
        ));
    }
    if duration >= LOOP_PERIOD_SECS && duration % LOOP_PERIOD_SECS < LOOP_REMAINDER_SECS {
        warnings.push(format!(
            "source duration {:.0}s sits near a 30-minute multiple; source may contain a looped recording",
            duration
        ));
    }
    warnings
}

fn validate_accelerated(
    actual: f64,
    size_bytes: u64,
    expected: f64,
) -> Result<(), MediaTransformError> {
    if size_bytes == 0 {
        return Err(MediaTransformError::Validation(
            "Duration mismatch: accelerated file is empty".to_string(),
        ));
    }
    if actual > DUPLICATION_RATIO * expected {
        return Err(MediaTransformError::Validation(format!(
            "Duration mismatch: accelerated file is {:.2}x the expected {:.1}s; source may contain concatenated duplicates",
            actual / expected,
            expected
        )));
    }
    if actual < CORRUPTION_RATIO * expected {
        return Err(MediaTransformError::Validation(format!(
            "Duration mismatch: accelerated file is {:.1}s, less than half the expected {:.1}s; transform output looks corrupt",
            actual, expected
        )));
    }
    let deviation = (actual - expected).abs() / expected;
    if deviation > DURATION_TOLERANCE {
        return Err(MediaTransformError::Validation(format!(
            "Duration mismatch: expected {:.1}s, got {:.1}s ({:.1}% off)",
            expected,
            actual,
            deviation * 100.0
        )));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum MediaTransformError {
    #[error("{0}")]
    Validation(String),
    #[error("media processing: {0}")]
    Media(#[from] MediaProcessorError),
}
