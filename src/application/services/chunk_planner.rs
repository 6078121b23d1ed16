use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{MediaProcessor, MediaProcessorError};
use crate::application::services::media_transform::AcceleratedAudio;
use crate::domain::{AudioChunk, JobPaths, SilenceSpan};

#[derive(Debug, Clone)]
pub struct ChunkPlannerConfig {
    /// Encoded chunk size cap.
    pub max_chunk_bytes: u64,
    /// Accelerated-duration cap per chunk.
    pub max_chunk_secs: f64,
    /// Legacy target slice length; binds when the caps allow larger
    /// slices.
    pub target_chunk_secs: f64,
    /// Snap window around each target boundary when silence data is
    /// available.
    pub silence_window_secs: f64,
    /// Snapped boundaries may not produce a chunk shorter than this;
    /// shorter candidates fall back to the exact cut.
    pub min_chunk_secs: f64,
}

impl Default for ChunkPlannerConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 18 * 1024 * 1024,
            max_chunk_secs: 1200.0,
            target_chunk_secs: 900.0,
            silence_window_secs: 5.0,
            min_chunk_secs: 30.0,
        }
    }
}

#[derive(Debug)]
pub struct ChunkPlan {
    pub chunks: Vec<AudioChunk>,
    pub warnings: Vec<String>,
}

/// Phase 2: slice the accelerated master into encoded chunks satisfying
/// both the size and duration caps, preferring cuts inside silence.
///
/// Cut offsets are accelerated-timeline; the emitted `AudioChunk`s carry
/// original-timeline start/duration so stitching never sees accelerated
/// values.
pub struct ChunkPlanner<M: MediaProcessor> {
    media: Arc<M>,
    config: ChunkPlannerConfig,
}

/// Floor for emitted chunks; boundaries that would produce less are
/// dropped.
const MIN_EMIT_SECS: f64 = 0.1;
/// Halving stops once the target falls below this.
const MIN_SPLIT_TARGET_SECS: f64 = 1.0;

impl<M: MediaProcessor> ChunkPlanner<M> {
    pub fn new(media: Arc<M>, config: ChunkPlannerConfig) -> Self {
        Self { media, config }
    }

    pub async fn plan_chunks(
        &self,
        paths: &JobPaths,
        master: &Path,
        audio: &AcceleratedAudio,
        silence: Option<&[SilenceSpan]>,
    ) -> Result<ChunkPlan, ChunkPlannerError> {
        let n = chunk_count(audio.original_bytes, audio.accelerated_duration, &self.config);
        let boundaries = plan_boundaries(audio.accelerated_duration, n, silence, &self.config);

        tracing::debug!(
            planned = n,
            boundaries = boundaries.len() - 1,
            strategy = if silence.is_some() { "snap-to-silence" } else { "uniform" },
            "Chunk plan computed"
        );

        let mut pending: VecDeque<(f64, f64)> = boundaries
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        let mut accepted: Vec<(f64, f64, std::path::PathBuf)> = Vec::new();
        let mut warnings = Vec::new();

        while let Some((start, end)) = pending.pop_front() {
            let index = accepted.len() + 1;
            let duration = end - start;
            let chunk_path = paths.chunk_path(index);

            self.media
                .cut(master, &chunk_path, start, duration)
                .await?;
            let probe = self.media.probe(&chunk_path).await?;

            let oversized = probe.size_bytes > self.config.max_chunk_bytes;
            let overlong = duration > self.config.max_chunk_secs;
            if (oversized || overlong) && duration / 2.0 >= MIN_SPLIT_TARGET_SECS {
                let _ = tokio::fs::remove_file(&chunk_path).await;
                let mid = (start + end) / 2.0;
                pending.push_front((mid, end));
                pending.push_front((start, mid));
                continue;
            }

            if oversized {
                warnings.push(format!(
                    "SIZE_EXCEEDED: chunk {} is {} bytes at a {:.1}s target; submitting anyway",
                    index, probe.size_bytes, duration
                ));
            }

            accepted.push((start, end, chunk_path));
        }

        let chunks = to_original_timeline(&accepted, audio);
        Ok(ChunkPlan { chunks, warnings })
    }
}

/// Lower bounds from the size cap, the duration cap, and the legacy
/// target; the plan uses whichever demands the most chunks.
fn chunk_count(original_bytes: u64, accelerated_duration: f64, config: &ChunkPlannerConfig) -> usize {
    let by_size = (original_bytes as f64 / config.max_chunk_bytes as f64).ceil() as usize;
    let by_cap = (accelerated_duration / config.max_chunk_secs).ceil() as usize;
    let by_target = (accelerated_duration / config.target_chunk_secs).ceil() as usize;
    by_size.max(by_cap).max(by_target).max(1)
}

/// Full boundary list `[0, b_1, .., b_{n-1}, total]` on the accelerated
/// timeline. Interior boundaries snap to the nearest silence center
/// within the window when that keeps both neighbours inside
/// `[min_chunk_secs, max_chunk_secs]`.
fn plan_boundaries(
    total: f64,
    n: usize,
    silence: Option<&[SilenceSpan]>,
    config: &ChunkPlannerConfig,
) -> Vec<f64> {
    let ideal = total / n as f64;
    let mut bounds = vec![0.0];

    for k in 1..n {
        let target = k as f64 * ideal;
        let prev = *bounds.last().unwrap_or(&0.0);

        let mut cut = target;
        if let Some(spans) = silence {
            if let Some(candidate) = nearest_silence_center(spans, target, config.silence_window_secs)
            {
                let fits_before = candidate - prev >= config.min_chunk_secs
                    && candidate - prev <= config.max_chunk_secs;
                let fits_after = total - candidate >= config.min_chunk_secs;
                if fits_before && fits_after {
                    cut = candidate;
                }
            }
        }

        if cut <= prev + MIN_EMIT_SECS {
            continue;
        }
        if cut >= total - MIN_EMIT_SECS {
            break;
        }
        bounds.push(cut);
    }

    bounds.push(total);
    bounds
}

fn nearest_silence_center(spans: &[SilenceSpan], target: f64, window: f64) -> Option<f64> {
    spans
        .iter()
        .map(|s| s.center())
        .filter(|c| (c - target).abs() <= window)
        .min_by(|a, b| {
            (a - target)
                .abs()
                .partial_cmp(&(b - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Map accepted accelerated spans onto the original timeline. The scale
/// is the measured ratio rather than the nominal factor so the durations
/// sum exactly to the source duration; the final chunk is pinned to the
/// source end to absorb rounding.
fn to_original_timeline(
    accepted: &[(f64, f64, std::path::PathBuf)],
    audio: &AcceleratedAudio,
) -> Vec<AudioChunk> {
    let scale = audio.original_duration / audio.accelerated_duration;
    let last = accepted.len().saturating_sub(1);

    accepted
        .iter()
        .enumerate()
        .map(|(i, (start, end, path))| {
            let original_start = start * scale;
            let original_duration = if i == last {
                audio.original_duration - original_start
            } else {
                (end - start) * scale
            };
            AudioChunk {
                index: i + 1,
                path: path.clone(),
                start_time: original_start,
                duration: original_duration,
                accelerated_duration: end - start,
            }
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkPlannerError {
    #[error("media processing: {0}")]
    Media(#[from] MediaProcessorError),
}
