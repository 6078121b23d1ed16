mod helpers;

use std::sync::Arc;

use quickscribe::application::services::{AcceleratedAudio, ChunkPlanner, ChunkPlannerConfig};
use quickscribe::domain::{JobId, JobPaths, SilenceSpan};

use helpers::StubMedia;

const MIB: u64 = 1024 * 1024;
const SIZE_CAP: u64 = 18 * MIB;
const DURATION_CAP: f64 = 1200.0;

struct Fixture {
    _dir: tempfile::TempDir,
    paths: JobPaths,
    master: std::path::PathBuf,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = JobPaths::new(
        &dir.path().join("temp"),
        &dir.path().join("output"),
        JobId::new(),
    );
    tokio::fs::create_dir_all(paths.chunks_dir()).await.unwrap();
    let master = paths.accelerated_path();
    tokio::fs::write(&master, vec![0u8; 4096]).await.unwrap();
    Fixture {
        _dir: dir,
        paths,
        master,
    }
}

fn audio(accelerated: f64, original: f64, bytes: u64) -> AcceleratedAudio {
    AcceleratedAudio {
        accelerated_duration: accelerated,
        original_duration: original,
        original_bytes: bytes,
    }
}

fn assert_plan_invariants(chunks: &[quickscribe::domain::AudioChunk], original_duration: f64) {
    assert!(!chunks.is_empty());
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i + 1);
        assert!(chunk.accelerated_duration <= DURATION_CAP);
        assert!(chunk.duration > 0.0);
    }
    for pair in chunks.windows(2) {
        let gap = (pair[0].start_time + pair[0].duration - pair[1].start_time).abs();
        assert!(gap < 0.01, "adjacent chunks drift by {}s", gap);
    }
    let total: f64 = chunks.iter().map(|c| c.duration).sum();
    assert!(
        (total - original_duration).abs() < 0.01,
        "durations sum to {} instead of {}",
        total,
        original_duration
    );
}

#[tokio::test]
async fn given_short_file_when_planning_then_one_chunk_covers_everything() {
    let f = fixture().await;
    let media = Arc::new(StubMedia::new(12.0, 2 * MIB));

    let plan = ChunkPlanner::new(Arc::clone(&media), ChunkPlannerConfig::default())
        .plan_chunks(&f.paths, &f.master, &audio(6.0, 12.0, 2 * MIB), None)
        .await
        .unwrap();

    assert_eq!(plan.chunks.len(), 1);
    assert!(plan.warnings.is_empty());
    assert_eq!(plan.chunks[0].start_time, 0.0);
    assert_plan_invariants(&plan.chunks, 12.0);
}

#[tokio::test]
async fn given_forty_minute_file_over_size_cap_when_planning_then_boundaries_tile_the_source() {
    let f = fixture().await;
    let media = Arc::new(StubMedia::new(2400.0, 36 * MIB));

    let plan = ChunkPlanner::new(Arc::clone(&media), ChunkPlannerConfig::default())
        .plan_chunks(&f.paths, &f.master, &audio(1200.0, 2400.0, 36 * MIB), None)
        .await
        .unwrap();

    assert!(plan.chunks.len() >= 2);
    assert_plan_invariants(&plan.chunks, 2400.0);
    for chunk in &plan.chunks {
        let size = (chunk.accelerated_duration * media.cut_bytes_per_sec) as u64;
        assert!(size <= SIZE_CAP);
    }
}

#[tokio::test]
async fn given_incompressible_audio_when_planning_then_chunks_halve_until_floor_and_warn() {
    let f = fixture().await;
    let mut media = StubMedia::new(6.0, 1 * MIB);
    // Every second of encoded audio is 30 MiB: no cut can satisfy the cap.
    media.cut_bytes_per_sec = 30.0 * MIB as f64;
    let media = Arc::new(media);

    let plan = ChunkPlanner::new(Arc::clone(&media), ChunkPlannerConfig::default())
        .plan_chunks(&f.paths, &f.master, &audio(6.0, 6.0, 1 * MIB), None)
        .await
        .unwrap();

    // Halving stopped at the 1s floor; every emitted chunk carries a
    // warning instead of failing the job.
    assert!(!plan.warnings.is_empty());
    for warning in &plan.warnings {
        assert!(warning.starts_with("SIZE_EXCEEDED"));
    }
    assert_eq!(plan.warnings.len(), plan.chunks.len());
    for chunk in &plan.chunks {
        assert!(chunk.accelerated_duration < 2.0);
    }
    assert_plan_invariants(&plan.chunks, 6.0);
}

#[tokio::test]
async fn given_long_audio_when_planning_then_no_chunk_exceeds_duration_cap() {
    let f = fixture().await;
    let media = Arc::new(StubMedia::new(6000.0, 4 * MIB));

    let plan = ChunkPlanner::new(Arc::clone(&media), ChunkPlannerConfig::default())
        .plan_chunks(&f.paths, &f.master, &audio(3000.0, 6000.0, 4 * MIB), None)
        .await
        .unwrap();

    // 3000s / 900s target demands 4 slices of 750s.
    assert_eq!(plan.chunks.len(), 4);
    assert_plan_invariants(&plan.chunks, 6000.0);
}

#[tokio::test]
async fn given_silence_near_boundary_when_planning_then_cut_lands_on_silence_center() {
    let f = fixture().await;
    let mut media = StubMedia::new(140.0, 20 * MIB);
    media.silence = vec![SilenceSpan {
        start: 36.0,
        end: 38.0,
    }];
    let media = Arc::new(media);

    let silence = media.silence.clone();
    let plan = ChunkPlanner::new(Arc::clone(&media), ChunkPlannerConfig::default())
        .plan_chunks(
            &f.paths,
            &f.master,
            &audio(70.0, 140.0, 20 * MIB),
            Some(&silence),
        )
        .await
        .unwrap();

    // 20 MiB demands 2 chunks; the 35s target snaps to the 37s center.
    assert_eq!(plan.chunks.len(), 2);
    assert!((plan.chunks[0].accelerated_duration - 37.0).abs() < 1e-6);
    assert!((plan.chunks[1].accelerated_duration - 33.0).abs() < 1e-6);
    assert_plan_invariants(&plan.chunks, 140.0);
}
