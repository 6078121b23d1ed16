use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::application::ports::ChunkTranscriber;
use crate::domain::{AudioChunk, ChunkResult};

#[derive(Debug, Clone)]
pub struct BatchCoordinatorConfig {
    /// Concurrent in-flight chunks.
    pub concurrency: usize,
    /// Batch-level passes over the failed set.
    pub global_attempts: u32,
}

impl Default for BatchCoordinatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            global_attempts: 3,
        }
    }
}

/// Phase 3 driver: fans chunks out to the transcriber under a semaphore
/// and re-runs the failed set up to `global_attempts` times. Successful
/// results land in the per-chunk cache, so a re-run resolves them
/// instantly and only genuinely failed chunks hit the service again.
pub struct BatchCoordinator<T: ChunkTranscriber + 'static> {
    transcriber: Arc<T>,
    config: BatchCoordinatorConfig,
}

impl<T: ChunkTranscriber + 'static> BatchCoordinator<T> {
    pub fn new(transcriber: Arc<T>, config: BatchCoordinatorConfig) -> Self {
        Self {
            transcriber,
            config,
        }
    }

    /// Results come back sorted by chunk index, one per input chunk.
    /// Partial failure is permitted here; severity is the orchestrator's
    /// call.
    pub async fn transcribe_all(&self, chunks: &[AudioChunk]) -> Vec<ChunkResult> {
        let mut results: BTreeMap<usize, ChunkResult> = BTreeMap::new();

        for attempt in 1..=self.config.global_attempts {
            let pending: Vec<AudioChunk> = chunks
                .iter()
                .filter(|c| match results.get(&c.index) {
                    None => true,
                    Some(r) => !r.success && !r.permanent_failure,
                })
                .cloned()
                .collect();

            if pending.is_empty() {
                break;
            }

            if attempt > 1 {
                let pause = Duration::from_secs(3 * (attempt as u64 - 1));
                tracing::info!(
                    attempt,
                    pending = pending.len(),
                    pause_secs = pause.as_secs(),
                    "Re-running failed chunks after pause"
                );
                tokio::time::sleep(pause).await;
            }

            for result in self.run_pass(pending).await {
                results.insert(result.index, result);
            }

            let failed = results.values().filter(|r| !r.success).count();
            if failed == 0 {
                break;
            }
            tracing::warn!(attempt, failed, "Batch pass finished with failures");
        }

        results.into_values().collect()
    }

    async fn run_pass(&self, chunks: Vec<AudioChunk>) -> Vec<ChunkResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let semaphore = Arc::clone(&semaphore);
            let transcriber = Arc::clone(&self.transcriber);
            handles.push((
                chunk.clone(),
                tokio::spawn(async move {
                    // Hold the permit for the whole attempt sequence.
                    let _permit = semaphore.acquire_owned().await.ok();
                    transcriber.transcribe(&chunk).await
                }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (chunk, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(chunk = chunk.index, error = %e, "Chunk task aborted");
                    results.push(ChunkResult::failed(
                        chunk,
                        format!("chunk task aborted: {}", e),
                        0,
                        false,
                    ));
                }
            }
        }
        results
    }
}
