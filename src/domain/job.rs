use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{JobStatus, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request transcription job record. Owned and mutated only by the
/// orchestrator driving it; terminal on the first transition to a
/// completed or failed status.
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub id: JobId,
    pub speed_factor: f64,
    pub output_format: OutputFormat,
    pub source_duration: f64,
    pub accelerated_duration: f64,
    pub status: JobStatus,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub total_retries: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TranscriptionJob {
    pub fn new(id: JobId, speed_factor: f64, output_format: OutputFormat) -> Self {
        Self {
            id,
            speed_factor,
            output_format,
            source_duration: 0.0,
            accelerated_duration: 0.0,
            status: JobStatus::Processing,
            total_chunks: 0,
            processed_chunks: 0,
            failed_chunks: 0,
            total_retries: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Transition to a terminal status. The first transition wins; later
    /// calls are ignored.
    pub fn finish(&mut self, status: JobStatus) {
        if self.finished_at.is_some() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn wall_time_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_terminal_transition_wins() {
        let mut job = TranscriptionJob::new(JobId::new(), 2.0, OutputFormat::Json);
        job.finish(JobStatus::Failed);
        job.finish(JobStatus::Completed);
        assert_eq!(job.status, JobStatus::Failed);
    }
}
