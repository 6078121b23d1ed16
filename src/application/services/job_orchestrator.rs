use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::application::ports::{MediaProcessor, TranscriptionApi};
use crate::application::services::batch_coordinator::{BatchCoordinator, BatchCoordinatorConfig};
use crate::application::services::chunk_cache::ChunkCache;
use crate::application::services::chunk_planner::{ChunkPlanner, ChunkPlannerConfig, ChunkPlannerError};
use crate::application::services::media_transform::{MediaTransformError, MediaTransformService};
use crate::application::services::timeline_stitcher::{StitcherConfig, TimelineStitcher};
use crate::application::services::transcriber_client::{RetryPolicy, TranscriberClient};
use crate::application::services::transcript_formatter::{to_plaintext, to_srt};
use crate::domain::{
    ArtifactPaths, JobPaths, JobSnapshot, JobStatus, OutputFormat, Transcript, TranscriptionJob,
    TranscriptionResult,
};

#[derive(Debug, Clone)]
pub struct SilenceDetectionConfig {
    pub threshold_db: f64,
    pub min_duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct JobOrchestratorConfig {
    pub retry_policy: RetryPolicy,
    pub coordinator: BatchCoordinatorConfig,
    pub planner: ChunkPlannerConfig,
    pub stitcher: StitcherConfig,
    /// Enables the snap-to-silence cutting strategy when set.
    pub silence: Option<SilenceDetectionConfig>,
    /// Soft cap on phase 3; in-flight attempts are abandoned at their
    /// next await point when it fires.
    pub soft_deadline: Option<Duration>,
    /// How long the working directory outlives the job before deletion.
    pub cleanup_delay: Duration,
}

impl Default for JobOrchestratorConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            coordinator: BatchCoordinatorConfig::default(),
            planner: ChunkPlannerConfig::default(),
            stitcher: StitcherConfig::default(),
            silence: None,
            soft_deadline: None,
            cleanup_delay: Duration::from_secs(300),
        }
    }
}

/// Phase driver for one transcription request: transform, plan,
/// transcribe, validate, stitch, emit artifacts. One orchestrator owns
/// one job directory; nothing is shared across jobs but the service
/// clients.
pub struct JobOrchestrator<M, A>
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
{
    media: Arc<M>,
    api: Arc<A>,
    transform: MediaTransformService<M>,
    planner: ChunkPlanner<M>,
    stitcher: TimelineStitcher,
    config: JobOrchestratorConfig,
}

impl<M, A> JobOrchestrator<M, A>
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
{
    pub fn new(media: Arc<M>, api: Arc<A>, config: JobOrchestratorConfig) -> Self {
        Self {
            transform: MediaTransformService::new(Arc::clone(&media)),
            planner: ChunkPlanner::new(Arc::clone(&media), config.planner.clone()),
            stitcher: TimelineStitcher::new(config.stitcher.clone()),
            media,
            api,
            config,
        }
    }

    /// Run all phases for one staged upload. The working directory is
    /// scheduled for deletion a few minutes after the terminal status,
    /// success or failure, so artifact downloads survive the job.
    pub async fn run(
        &self,
        paths: &JobPaths,
        source: &Path,
        speed_factor: f64,
        format: OutputFormat,
    ) -> Result<TranscriptionResult, JobError> {
        let span = tracing::info_span!("transcription_job", job_id = %paths.id());
        let result = self
            .execute(paths, source, speed_factor, format)
            .instrument(span)
            .await;

        self.schedule_cleanup(paths);
        result
    }

    async fn execute(
        &self,
        paths: &JobPaths,
        source: &Path,
        speed_factor: f64,
        format: OutputFormat,
    ) -> Result<TranscriptionResult, JobError> {
        let mut job = TranscriptionJob::new(paths.id(), speed_factor, format);

        tokio::fs::create_dir_all(paths.chunks_dir()).await?;
        tokio::fs::create_dir_all(paths.transcripts_dir()).await?;

        // Phase 1: accelerated master.
        let (audio, mut warnings) = self
            .transform
            .process_audio(source, &paths.accelerated_path(), speed_factor)
            .await?;
        job.source_duration = audio.original_duration;
        job.accelerated_duration = audio.accelerated_duration;
        tracing::info!(
            source_duration = audio.original_duration,
            accelerated_duration = audio.accelerated_duration,
            "Transform finished"
        );

        // Phase 2: chunk plan. Silence detection is best-effort; a failed
        // pass falls back to uniform cuts.
        let silence = match &self.config.silence {
            Some(cfg) => match self
                .media
                .detect_silence(
                    &paths.accelerated_path(),
                    cfg.threshold_db,
                    cfg.min_duration_secs,
                )
                .await
            {
                Ok(spans) => Some(spans),
                Err(e) => {
                    tracing::warn!(error = %e, "Silence detection failed; cutting uniformly");
                    None
                }
            },
            None => None,
        };
        let plan = self
            .planner
            .plan_chunks(paths, &paths.accelerated_path(), &audio, silence.as_deref())
            .await?;
        job.total_chunks = plan.chunks.len();
        warnings.extend(plan.warnings);
        tracing::info!(chunks = job.total_chunks, "Chunk plan emitted");

        // Phase 3: bounded-concurrency transcription with per-job cache.
        let cache = ChunkCache::new(paths.transcripts_dir());
        let client = Arc::new(TranscriberClient::new(
            Arc::clone(&self.api),
            cache,
            self.config.retry_policy.clone(),
        ));
        let coordinator = BatchCoordinator::new(client, self.config.coordinator.clone());
        let results = match self.config.soft_deadline {
            Some(deadline) => tokio::time::timeout(deadline, coordinator.transcribe_all(&plan.chunks))
                .await
                .map_err(|_| JobError::DeadlineExceeded(deadline))?,
            None => coordinator.transcribe_all(&plan.chunks).await,
        };

        job.processed_chunks = results.iter().filter(|r| r.success).count();
        job.failed_chunks = results.len() - job.processed_chunks;
        job.total_retries = results.iter().map(|r| r.retries).sum();

        if job.processed_chunks == 0 {
            let last_error = results
                .iter()
                .filter_map(|r| r.error.clone())
                .next_back()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(JobError::AllChunksFailed(results.len(), last_error));
        }

        // Phase 4: something must have been transcribed.
        if !results.iter().any(|r| r.success && !r.segments.is_empty()) {
            return Err(JobError::NoSegments);
        }

        // Phase 5: stitch onto the original timeline.
        let stitched = self
            .stitcher
            .stitch(&results, speed_factor, audio.original_duration);
        if stitched.segments.is_empty() {
            return Err(JobError::NoSegments);
        }

        // Phase 6: artifacts.
        tokio::fs::create_dir_all(paths.output_dir()).await?;
        let srt = to_srt(&stitched.segments);
        let full_text = to_plaintext(&stitched.segments);
        tokio::fs::write(paths.srt_path(), &srt).await?;
        tokio::fs::write(paths.txt_path(), &full_text).await?;

        // Phase 7: terminal status. Informational transform warnings do
        // not downgrade a clean job; stitcher findings and failed chunks
        // do.
        let status = if job.failed_chunks == 0 && stitched.warnings.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::CompletedWithWarnings
        };
        warnings.extend(stitched.warnings);
        job.finish(status);

        let result = TranscriptionResult {
            job: JobSnapshot::from(&job),
            transcript: Transcript {
                segments: stitched.segments,
                full_text,
                formats: Some(ArtifactPaths {
                    srt_path: paths.srt_path().to_string_lossy().into_owned(),
                    txt_path: paths.txt_path().to_string_lossy().into_owned(),
                }),
            },
            warnings,
        };

        let payload = serde_json::to_vec_pretty(&result)
            .map_err(|e| JobError::Artifact(e.to_string()))?;
        tokio::fs::write(paths.result_path(), payload).await?;

        tracing::info!(
            status = %result.job.status,
            segments = result.transcript.segments.len(),
            failed_chunks = job.failed_chunks,
            retries = job.total_retries,
            "Job finished"
        );
        Ok(result)
    }

    fn schedule_cleanup(&self, paths: &JobPaths) {
        let work_dir = paths.work_dir().to_path_buf();
        let delay = self.config.cleanup_delay;
        let job_id = paths.id();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_dir_all(&work_dir).await {
                Ok(()) => tracing::debug!(job_id = %job_id, "Removed job working directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to remove job working directory")
                }
            }
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("media transform: {0}")]
    Transform(#[from] MediaTransformError),
    #[error("chunk planning: {0}")]
    Planning(#[from] ChunkPlannerError),
    #[error("all {0} chunks failed; last error: {1}")]
    AllChunksFailed(usize, String),
    #[error("no transcript segments were produced")]
    NoSegments,
    #[error("job exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),
    #[error("artifact serialization: {0}")]
    Artifact(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Input and media validation problems are the caller's to fix;
    /// everything else is on us or the upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, JobError::Transform(MediaTransformError::Validation(_)))
    }
}
