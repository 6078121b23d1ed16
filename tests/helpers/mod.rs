#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quickscribe::application::ports::{
    ImageGenerator, ImageGeneratorError, LlmClient, LlmClientError, MediaProbe, MediaProcessor,
    MediaProcessorError, TranscriptionApi, TranscriptionApiError, VerboseSegment,
    VerboseTranscription,
};
use quickscribe::domain::SilenceSpan;

/// Programmable media tool double. Acceleration and cuts write small
/// real files so downstream file checks hold; probe sizes are computed
/// from `cut_bytes_per_sec` so size-cap behavior can be scripted without
/// writing large files.
pub struct StubMedia {
    pub source_duration: f64,
    pub source_bytes: u64,
    /// Probed duration of the accelerated output; `None` derives it
    /// from the last acceleration factor.
    pub accelerated_duration_override: Option<f64>,
    pub cut_bytes_per_sec: f64,
    pub silence: Vec<SilenceSpan>,
    pub accelerate_calls: AtomicUsize,
    pub cut_calls: AtomicUsize,
    last_factor: Mutex<f64>,
    accelerated_output: Mutex<Option<PathBuf>>,
    cuts: Mutex<HashMap<PathBuf, (f64, f64)>>,
}

impl StubMedia {
    pub fn new(source_duration: f64, source_bytes: u64) -> Self {
        Self {
            source_duration,
            source_bytes,
            accelerated_duration_override: None,
            cut_bytes_per_sec: 1_000.0,
            silence: Vec::new(),
            accelerate_calls: AtomicUsize::new(0),
            cut_calls: AtomicUsize::new(0),
            last_factor: Mutex::new(1.0),
            accelerated_output: Mutex::new(None),
            cuts: Mutex::new(HashMap::new()),
        }
    }

    fn accelerated_duration(&self) -> f64 {
        self.accelerated_duration_override
            .unwrap_or_else(|| self.source_duration / *self.last_factor.lock().unwrap())
    }
}

#[async_trait]
impl MediaProcessor for StubMedia {
    async fn accelerate(
        &self,
        _input: &Path,
        output: &Path,
        factor: f64,
    ) -> Result<(), MediaProcessorError> {
        self.accelerate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_factor.lock().unwrap() = factor;
        *self.accelerated_output.lock().unwrap() = Some(output.to_path_buf());
        tokio::fs::write(output, vec![0u8; 4096]).await?;
        Ok(())
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, MediaProcessorError> {
        if let Some(accelerated) = self.accelerated_output.lock().unwrap().as_deref() {
            if accelerated == path {
                return Ok(MediaProbe {
                    duration: self.accelerated_duration(),
                    size_bytes: self.source_bytes,
                });
            }
        }
        if let Some((_, duration)) = self.cuts.lock().unwrap().get(path) {
            return Ok(MediaProbe {
                duration: *duration,
                size_bytes: (duration * self.cut_bytes_per_sec) as u64,
            });
        }
        Ok(MediaProbe {
            duration: self.source_duration,
            size_bytes: self.source_bytes,
        })
    }

    async fn cut(
        &self,
        _input: &Path,
        output: &Path,
        start: f64,
        duration: f64,
    ) -> Result<(), MediaProcessorError> {
        self.cut_calls.fetch_add(1, Ordering::SeqCst);
        self.cuts
            .lock()
            .unwrap()
            .insert(output.to_path_buf(), (start, duration));
        tokio::fs::write(output, vec![0u8; 4096]).await?;
        Ok(())
    }

    async fn detect_silence(
        &self,
        _input: &Path,
        _threshold_db: f64,
        _min_duration: f64,
    ) -> Result<Vec<SilenceSpan>, MediaProcessorError> {
        Ok(self.silence.clone())
    }

    async fn burn_subtitles(
        &self,
        _video: &Path,
        _subtitles: &Path,
        output: &Path,
    ) -> Result<(), MediaProcessorError> {
        tokio::fs::write(output, b"video").await?;
        Ok(())
    }

    async fn image_to_video(
        &self,
        _image: &Path,
        output: &Path,
        _duration: f64,
        _zoom: f64,
    ) -> Result<(), MediaProcessorError> {
        tokio::fs::write(output, b"video").await?;
        Ok(())
    }
}

/// One scripted reaction of the transcription service double.
#[derive(Clone)]
pub enum Scripted {
    Ok(VerboseTranscription),
    Status(u16),
    Network,
}

/// Transcription service double: per-file-name scripts, falling back to
/// a default payload. Counts every call.
pub struct StubApi {
    scripts: Mutex<HashMap<String, Vec<Scripted>>>,
    default_response: VerboseTranscription,
    pub calls: AtomicUsize,
}

impl StubApi {
    pub fn new(default_response: VerboseTranscription) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue reactions for the chunk file with the given name; once the
    /// queue drains the default payload is served.
    pub fn script(&self, file_name: &str, reactions: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), reactions);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn payload(duration: f64, text: &str) -> VerboseTranscription {
    VerboseTranscription {
        task: "transcribe".to_string(),
        language: "en".to_string(),
        duration,
        text: text.to_string(),
        segments: vec![VerboseSegment {
            id: 0,
            start: 0.0,
            end: duration,
            text: text.to_string(),
        }],
    }
}

pub fn repeated_payload(duration: f64, text: &str, count: usize) -> VerboseTranscription {
    let step = duration / count as f64;
    VerboseTranscription {
        task: "transcribe".to_string(),
        language: "en".to_string(),
        duration,
        text: std::iter::repeat(text).take(count).collect::<Vec<_>>().join(" "),
        segments: (0..count)
            .map(|i| VerboseSegment {
                id: i as i64,
                start: i as f64 * step,
                end: (i + 1) as f64 * step,
                text: text.to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl TranscriptionApi for StubApi {
    async fn transcribe_file(
        &self,
        path: &Path,
    ) -> Result<VerboseTranscription, TranscriptionApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let reaction = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&file_name) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        match reaction {
            None => Ok(self.default_response.clone()),
            Some(Scripted::Ok(payload)) => Ok(payload),
            Some(Scripted::Network) => {
                Err(TranscriptionApiError::Network("connection reset".to_string()))
            }
            Some(Scripted::Status(400)) => {
                Err(TranscriptionApiError::InvalidRequest("bad audio".to_string()))
            }
            Some(Scripted::Status(413)) => Err(TranscriptionApiError::PayloadTooLarge(
                "payload over 25 MiB".to_string(),
            )),
            Some(Scripted::Status(status)) => Err(TranscriptionApiError::Upstream {
                status,
                message: "upstream error".to_string(),
            }),
        }
    }
}

pub struct StubLlm;

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmClientError> {
        Ok(format!("{}, in golden evening light", prompt))
    }
}

pub struct StubImageGenerator;

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ImageGeneratorError> {
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }
}
