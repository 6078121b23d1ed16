use serde::Serialize;

use super::{Segment, TranscriptionJob};

/// Immutable view of a job attached to responses and artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: String,
    pub speed_factor: f64,
    pub source_duration: f64,
    pub accelerated_duration: f64,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub total_retries: u32,
    pub wall_time_secs: f64,
}

impl From<&TranscriptionJob> for JobSnapshot {
    fn from(job: &TranscriptionJob) -> Self {
        Self {
            id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            speed_factor: job.speed_factor,
            source_duration: job.source_duration,
            accelerated_duration: job.accelerated_duration,
            total_chunks: job.total_chunks,
            processed_chunks: job.processed_chunks,
            failed_chunks: job.failed_chunks,
            total_retries: job.total_retries,
            wall_time_secs: job.wall_time_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactPaths {
    pub srt_path: String,
    pub txt_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<ArtifactPaths>,
}

/// Final product of a transcription job.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResult {
    pub job: JobSnapshot,
    pub transcript: Transcript,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
