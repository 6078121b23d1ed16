use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::ffprobe::ffprobe_path;
use regex::Regex;
use serde::Deserialize;

use crate::application::ports::{MediaProbe, MediaProcessor, MediaProcessorError};
use crate::domain::SilenceSpan;

pub fn check_ffmpeg_binary() -> Result<(), MediaProcessorError> {
    let mut child = FfmpegCommand::new().arg("-version").spawn().map_err(|e| {
        MediaProcessorError::ToolFailed(format!("ffmpeg binary not found in $PATH: {}", e))
    })?;

    let status = child.wait().map_err(|e| {
        MediaProcessorError::ToolFailed(format!("ffmpeg version check failed: {}", e))
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(MediaProcessorError::ToolFailed(
            "ffmpeg binary returned non-zero exit code during version check".to_string(),
        ))
    }
}

/// `MediaProcessor` adapter over the ffmpeg/ffprobe binaries.
///
/// Invocations are blocking child processes, so every operation runs
/// under `spawn_blocking`.
pub struct FfmpegProcessor;

impl FfmpegProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// The atempo filter accepts factors in [0.5, 2.0] per instance; larger
/// factors are expressed as a chain.
fn atempo_chain(factor: f64) -> String {
    let mut remaining = factor;
    let mut stages = Vec::new();
    while remaining > 2.0 {
        stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    stages.push(format!("atempo={:.6}", remaining));
    stages.join(",")
}

fn run_ffmpeg(args: Vec<String>) -> Result<(), MediaProcessorError> {
    let arg_line = args.join(" ");
    let mut child = FfmpegCommand::new()
        .args(args.iter().map(String::as_str))
        .spawn()
        .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg spawn failed: {}", e)))?;

    let stderr_tail = child.take_stderr().map(|mut stderr| {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        tail_of(&buf)
    });

    let status = child
        .wait()
        .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg wait: {}", e)))?;

    if !status.success() {
        return Err(MediaProcessorError::ToolFailed(format!(
            "ffmpeg exited with non-zero status ({}): {}",
            arg_line,
            stderr_tail.unwrap_or_default()
        )));
    }

    Ok(())
}

/// Capture ffmpeg stderr while the command runs; used for silencedetect,
/// whose findings are only reported there.
fn run_ffmpeg_capture_stderr(args: Vec<String>) -> Result<String, MediaProcessorError> {
    let mut child = FfmpegCommand::new()
        .args(args.iter().map(String::as_str))
        .spawn()
        .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg spawn failed: {}", e)))?;

    let mut stderr = child.take_stderr().ok_or_else(|| {
        MediaProcessorError::ToolFailed("ffmpeg stderr unavailable".to_string())
    })?;

    let mut output = String::new();
    stderr
        .read_to_string(&mut output)
        .map_err(|e| MediaProcessorError::ToolFailed(format!("reading ffmpeg stderr: {}", e)))?;

    let status = child
        .wait()
        .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg wait: {}", e)))?;

    if !status.success() {
        return Err(MediaProcessorError::ToolFailed(format!(
            "ffmpeg exited with non-zero status: {}",
            tail_of(&output)
        )));
    }

    Ok(output)
}

fn tail_of(s: &str) -> String {
    const TAIL: usize = 400;
    let trimmed = s.trim();
    if trimmed.len() <= TAIL {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - TAIL;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

fn probe_blocking(path: &Path) -> Result<MediaProbe, MediaProcessorError> {
    let output = Command::new(ffprobe_path())
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration,size",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| MediaProcessorError::ProbeFailed(format!("ffprobe spawn failed: {}", e)))?;

    if !output.status.success() {
        return Err(MediaProcessorError::ProbeFailed(format!(
            "ffprobe exited with non-zero status: {}",
            tail_of(&String::from_utf8_lossy(&output.stderr))
        )));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaProcessorError::ProbeFailed(format!("ffprobe output: {}", e)))?;

    let duration = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            MediaProcessorError::ProbeFailed("ffprobe reported no duration".to_string())
        })?;
    let size_bytes = parsed
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    Ok(MediaProbe {
        duration,
        size_bytes,
    })
}

fn parse_silence_intervals(stderr: &str) -> Vec<SilenceSpan> {
    // silencedetect logs pairs of lines:
    //   [silencedetect @ ...] silence_start: 12.345
    //   [silencedetect @ ...] silence_end: 13.678 | silence_duration: 1.333
    let start_re = Regex::new(r"silence_start:\s*([0-9.]+)").unwrap();
    let end_re = Regex::new(r"silence_end:\s*([0-9.]+)").unwrap();

    let mut spans = Vec::new();
    let mut pending_start: Option<f64> = None;

    for line in stderr.lines() {
        if let Some(cap) = start_re.captures(line) {
            pending_start = cap[1].parse::<f64>().ok();
        } else if let Some(cap) = end_re.captures(line) {
            if let (Some(start), Some(end)) = (pending_start.take(), cap[1].parse::<f64>().ok()) {
                if end > start {
                    spans.push(SilenceSpan { start, end });
                }
            }
        }
    }

    spans
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn accelerate(
        &self,
        input: &Path,
        output: &Path,
        factor: f64,
    ) -> Result<(), MediaProcessorError> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-vn".into(),
        ];
        if factor > 1.0 {
            args.push("-filter:a".into());
            args.push(atempo_chain(factor));
        }
        args.extend([
            "-acodec".into(),
            "pcm_s16le".into(),
            output.to_string_lossy().into_owned(),
        ]);

        tokio::task::spawn_blocking(move || run_ffmpeg(args))
            .await
            .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg task join: {}", e)))?
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, MediaProcessorError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe_blocking(&path))
            .await
            .map_err(|e| MediaProcessorError::ProbeFailed(format!("ffprobe task join: {}", e)))?
    }

    async fn cut(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        duration: f64,
    ) -> Result<(), MediaProcessorError> {
        let args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-ss".into(),
            format!("{:.3}", start),
            "-t".into(),
            format!("{:.3}", duration),
            "-vn".into(),
            "-acodec".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            "128k".into(),
            output.to_string_lossy().into_owned(),
        ];

        tokio::task::spawn_blocking(move || run_ffmpeg(args))
            .await
            .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg task join: {}", e)))?
    }

    async fn detect_silence(
        &self,
        input: &Path,
        threshold_db: f64,
        min_duration: f64,
    ) -> Result<Vec<SilenceSpan>, MediaProcessorError> {
        let args: Vec<String> = vec![
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-af".into(),
            format!("silencedetect=noise={}dB:d={}", threshold_db, min_duration),
            "-f".into(),
            "null".into(),
            "-".into(),
        ];

        let stderr = tokio::task::spawn_blocking(move || run_ffmpeg_capture_stderr(args))
            .await
            .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg task join: {}", e)))??;

        let spans = parse_silence_intervals(&stderr);
        tracing::debug!(intervals = spans.len(), "Silence detection pass finished");
        Ok(spans)
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<(), MediaProcessorError> {
        let args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            video.to_string_lossy().into_owned(),
            "-vf".into(),
            format!("subtitles={}", subtitles.to_string_lossy()),
            "-c:a".into(),
            "copy".into(),
            output.to_string_lossy().into_owned(),
        ];

        tokio::task::spawn_blocking(move || run_ffmpeg(args))
            .await
            .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg task join: {}", e)))?
    }

    async fn image_to_video(
        &self,
        image: &Path,
        output: &Path,
        duration: f64,
        zoom: f64,
    ) -> Result<(), MediaProcessorError> {
        const FPS: u32 = 25;
        let frames = (duration * FPS as f64).round().max(1.0) as u64;
        let args: Vec<String> = vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-i".into(),
            image.to_string_lossy().into_owned(),
            "-vf".into(),
            format!(
                "zoompan=z='min(zoom+0.0015,{:.3})':d={}:s=1280x720,format=yuv420p",
                zoom, frames
            ),
            "-t".into(),
            format!("{:.3}", duration),
            "-r".into(),
            FPS.to_string(),
            output.to_string_lossy().into_owned(),
        ];

        tokio::task::spawn_blocking(move || run_ffmpeg(args))
            .await
            .map_err(|e| MediaProcessorError::ToolFailed(format!("ffmpeg task join: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atempo_chain_single_stage_below_two() {
        assert_eq!(atempo_chain(1.5), "atempo=1.500000");
    }

    #[test]
    fn atempo_chain_splits_factors_above_two() {
        assert_eq!(atempo_chain(3.0), "atempo=2.0,atempo=1.500000");
    }

    #[test]
    fn parses_silence_detect_output() {
        let stderr = "\
[silencedetect @ 0x55] silence_start: 10.5\n\
frame=  100\n\
[silencedetect @ 0x55] silence_end: 11.75 | silence_duration: 1.25\n\
[silencedetect @ 0x55] silence_start: 30.0\n\
[silencedetect @ 0x55] silence_end: 30.6 | silence_duration: 0.6\n";
        let spans = parse_silence_intervals(stderr);
        assert_eq!(spans.len(), 2);
        assert!((spans[0].start - 10.5).abs() < 1e-9);
        assert!((spans[0].end - 11.75).abs() < 1e-9);
        assert!((spans[1].center() - 30.3).abs() < 1e-9);
    }

    #[test]
    fn unpaired_silence_start_is_dropped() {
        let spans = parse_silence_intervals("[silencedetect @ 0x55] silence_start: 42.0\n");
        assert!(spans.is_empty());
    }
}
