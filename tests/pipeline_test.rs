mod helpers;

use std::sync::Arc;
use std::time::Duration;

use quickscribe::application::services::{
    JobError, JobOrchestrator, JobOrchestratorConfig, RetryPolicy,
};
use quickscribe::domain::{JobId, JobPaths, OutputFormat};

use helpers::{payload, repeated_payload, Scripted, StubApi, StubMedia};

const MIB: u64 = 1024 * 1024;

struct Fixture {
    _dir: tempfile::TempDir,
    paths: JobPaths,
    source: std::path::PathBuf,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = JobPaths::new(
        &dir.path().join("temp"),
        &dir.path().join("output"),
        JobId::new(),
    );
    tokio::fs::create_dir_all(paths.work_dir()).await.unwrap();
    let source = paths.source_path("mp3");
    tokio::fs::write(&source, vec![0u8; 4096]).await.unwrap();
    Fixture {
        _dir: dir,
        paths,
        source,
    }
}

fn config(max_retries: u32) -> JobOrchestratorConfig {
    JobOrchestratorConfig {
        retry_policy: RetryPolicy {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
        ..JobOrchestratorConfig::default()
    }
}

fn orchestrator(
    media: Arc<StubMedia>,
    api: Arc<StubApi>,
    max_retries: u32,
) -> JobOrchestrator<StubMedia, StubApi> {
    JobOrchestrator::new(media, api, config(max_retries))
}

#[tokio::test]
async fn given_single_short_file_when_running_then_one_chunk_completes_cleanly() {
    let f = fixture().await;
    let media = Arc::new(StubMedia::new(12.0, 2 * MIB));
    let api = Arc::new(StubApi::new(payload(6.0, "a short meeting recording")));

    let result = orchestrator(Arc::clone(&media), Arc::clone(&api), 5)
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(result.job.status, "completed");
    assert_eq!(result.job.total_chunks, 1);
    assert_eq!(result.job.failed_chunks, 0);
    assert_eq!(api.call_count(), 1);

    // Segments cover 0-12s on the original timeline.
    assert_eq!(result.transcript.segments.len(), 1);
    assert!((result.transcript.segments[0].start - 0.0).abs() < 0.001);
    assert!((result.transcript.segments[0].end - 12.0).abs() < 0.001);
    assert!(result.warnings.is_empty());

    // Artifacts landed in the output directory.
    assert!(f.paths.srt_path().exists());
    assert!(f.paths.txt_path().exists());
    assert!(f.paths.result_path().exists());
}

#[tokio::test]
async fn given_transient_upstream_errors_when_running_then_chunk_recovers_with_counted_retries() {
    let f = fixture().await;
    // 40 MiB forces 3 chunks of ~10 accelerated seconds each.
    let media = Arc::new(StubMedia::new(60.0, 40 * MIB));
    let api = Arc::new(StubApi::new(payload(10.0, "steady narration continues here")));
    api.script(
        "chunk_002.mp3",
        vec![
            Scripted::Status(502),
            Scripted::Status(502),
            Scripted::Ok(payload(10.0, "steady narration continues here")),
        ],
    );

    let result = orchestrator(Arc::clone(&media), Arc::clone(&api), 5)
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(result.job.status, "completed");
    assert_eq!(result.job.total_chunks, 3);
    assert_eq!(result.job.total_retries, 2);
    // One call each for chunks 1 and 3, three for chunk 2.
    assert_eq!(api.call_count(), 5);
}

#[tokio::test]
async fn given_hard_payload_rejection_when_running_then_chunk_is_reported_and_job_degrades() {
    let f = fixture().await;
    // 80 MiB forces 5 chunks; each covers 20 original seconds.
    let media = Arc::new(StubMedia::new(100.0, 80 * MIB));
    let api = Arc::new(StubApi::new(payload(10.0, "ordinary conversational audio")));
    api.script("chunk_003.mp3", vec![Scripted::Status(413)]);

    let result = orchestrator(Arc::clone(&media), Arc::clone(&api), 5)
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(result.job.status, "completed_with_warnings");
    assert_eq!(result.job.failed_chunks, 1);

    // The rejection is terminal: no per-chunk retries and no global
    // re-attempt, so exactly one call per chunk.
    assert_eq!(api.call_count(), 5);

    let failure = result
        .warnings
        .iter()
        .find(|w| w.starts_with("CHUNK_FAILED"))
        .expect("missing failed-chunk warning");
    assert!(failure.contains("chunk 3"));
    assert!(failure.contains("40.00s-60.00s"));
}

#[tokio::test(start_paused = true)]
async fn given_persistent_hallucination_when_running_then_job_degrades_with_quality_alert() {
    let f = fixture().await;
    // 20 MiB forces 2 chunks.
    let media = Arc::new(StubMedia::new(40.0, 20 * MIB));
    let api = Arc::new(StubApi::new(payload(10.0, "normal second chunk content")));
    // Chunk 1 hallucinates on every attempt: 2 attempts per pass across
    // 3 global passes.
    api.script(
        "chunk_001.mp3",
        vec![Scripted::Ok(repeated_payload(10.0, "ok ok", 4)); 6],
    );

    let result = orchestrator(Arc::clone(&media), Arc::clone(&api), 1)
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(result.job.status, "completed_with_warnings");
    assert_eq!(result.job.failed_chunks, 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("CHUNK_FAILED") && w.contains("hallucination")));
    // 1 of 2 chunks failed: over the 30% failure-rate threshold.
    assert!(result.warnings.iter().any(|w| w.starts_with("QUALITY_ALERT")));
    assert_eq!(api.call_count(), 7);
}

#[tokio::test]
async fn given_unaccelerated_output_when_running_then_job_fails_before_chunking() {
    let f = fixture().await;
    let mut media = StubMedia::new(3600.0, 8 * MIB);
    media.accelerated_duration_override = Some(3600.0);
    let media = Arc::new(media);
    let api = Arc::new(StubApi::new(payload(10.0, "unused")));

    let err = orchestrator(Arc::clone(&media), Arc::clone(&api), 5)
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Transform(_)));
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Duration mismatch"));
    // Chunking never started.
    assert_eq!(media.cut_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn given_completed_job_when_rerunning_over_same_directory_then_cache_supplies_results() {
    let f = fixture().await;
    let media = Arc::new(StubMedia::new(12.0, 2 * MIB));
    let api = Arc::new(StubApi::new(payload(6.0, "a short meeting recording")));
    let orchestrator = orchestrator(Arc::clone(&media), Arc::clone(&api), 5);

    let first = orchestrator
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();
    assert_eq!(api.call_count(), 1);

    let second = orchestrator
        .run(&f.paths, &f.source, 2.0, OutputFormat::Json)
        .await
        .unwrap();

    // The cached transcript satisfied the rerun without another call.
    assert_eq!(api.call_count(), 1);
    assert_eq!(
        first
            .transcript
            .segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>(),
        second
            .transcript
            .segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
    );
}
