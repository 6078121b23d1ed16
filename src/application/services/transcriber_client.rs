use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use unicode_normalization::UnicodeNormalization;

use crate::application::ports::{
    ChunkTranscriber, TranscriptionApi, VerboseSegment, VerboseTranscription,
};
use crate::application::services::chunk_cache::ChunkCache;
use crate::domain::{AudioChunk, ChunkResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = retries + 1.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Exponential base-2 backoff with full jitter: a uniform draw from
    /// zero up to the capped exponential ceiling.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let ceiling = self
            .initial_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_delay);
        let millis = ceiling.as_millis() as u64;
        if millis == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }
}

/// Outcome of a single attempt against the service. Retry flow branches
/// on this value; no attempt failure is raised as an error.
enum AttemptOutcome {
    Accepted(VerboseTranscription),
    Retry(String),
    Fatal(String),
}

/// The external service rejects payloads above this.
const SERVICE_PAYLOAD_CAP: u64 = 25 * 1024 * 1024;
/// Files under this are suspicious but submitted anyway.
const TINY_FILE_BYTES: u64 = 1024;
/// Tolerance when validating a cached payload against its chunk.
const CACHE_DURATION_TOLERANCE: f64 = 0.05;
/// Consecutive identical segments that count as a hallucination.
const HALLUCINATION_RUN: usize = 3;
/// Repeats shorter than this are not evidence of hallucination.
const HALLUCINATION_MIN_CHARS: usize = 5;

/// Phase 3 worker: drives one chunk through the transcription service
/// with caching, retry and response sanity checks. The cache is per-job
/// state handed in by the orchestrator, so concurrent jobs never share
/// entries.
pub struct TranscriberClient<A: TranscriptionApi> {
    api: Arc<A>,
    cache: ChunkCache,
    policy: RetryPolicy,
}

impl<A: TranscriptionApi> TranscriberClient<A> {
    pub fn new(api: Arc<A>, cache: ChunkCache, policy: RetryPolicy) -> Self {
        Self { api, cache, policy }
    }

    pub async fn transcribe_chunk(&self, chunk: &AudioChunk) -> ChunkResult {
        if let Some(cached) = self.cache.load(chunk.index).await {
            if cached_payload_matches(&cached, chunk) {
                tracing::debug!(chunk = chunk.index, "Cache hit; skipping service call");
                let segments = cached.service_segments();
                return ChunkResult::succeeded(chunk.clone(), segments, cached.duration, 0);
            }
            tracing::warn!(
                chunk = chunk.index,
                cached_duration = cached.duration,
                chunk_duration = chunk.accelerated_duration,
                "Cached payload does not match chunk; invalidating"
            );
            self.cache.remove(chunk.index).await;
        }

        if let Err(message) = self.preflight(chunk).await {
            return ChunkResult::failed(chunk.clone(), message, 0, true);
        }

        let attempts = self.policy.max_retries + 1;
        let mut retries = 0u32;
        let mut last_error = String::from("no attempts made");

        for attempt in 0..attempts {
            match self.attempt(chunk).await {
                AttemptOutcome::Accepted(payload) => {
                    if let Err(e) = self.cache.store(chunk.index, &payload).await {
                        tracing::warn!(chunk = chunk.index, error = %e, "Failed to cache response");
                    }
                    let segments = payload.service_segments();
                    return ChunkResult::succeeded(
                        chunk.clone(),
                        segments,
                        payload.duration,
                        retries,
                    );
                }
                AttemptOutcome::Fatal(message) => {
                    tracing::warn!(chunk = chunk.index, error = %message, "Non-retryable failure");
                    return ChunkResult::failed(chunk.clone(), message, retries, true);
                }
                AttemptOutcome::Retry(message) => {
                    last_error = message;
                    if attempt + 1 < attempts {
                        retries += 1;
                        let delay = self.policy.backoff_delay(attempt);
                        tracing::debug!(
                            chunk = chunk.index,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %last_error,
                            "Attempt failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        tracing::warn!(
            chunk = chunk.index,
            retries,
            error = %last_error,
            "Chunk failed after exhausting retries"
        );
        ChunkResult::failed(chunk.clone(), last_error, retries, false)
    }

    async fn preflight(&self, chunk: &AudioChunk) -> Result<(), String> {
        let size = tokio::fs::metadata(&chunk.path)
            .await
            .map(|m| m.len())
            .map_err(|e| format!("chunk file unreadable: {}", e))?;

        if size == 0 {
            return Err("chunk file is empty".to_string());
        }
        if size > SERVICE_PAYLOAD_CAP {
            return Err(format!(
                "chunk file is {} bytes, above the service cap of {} bytes",
                size, SERVICE_PAYLOAD_CAP
            ));
        }
        if size < TINY_FILE_BYTES {
            tracing::warn!(
                chunk = chunk.index,
                bytes = size,
                "Chunk file is under 1 KiB; transcription may be empty"
            );
        }
        Ok(())
    }

    async fn attempt(&self, chunk: &AudioChunk) -> AttemptOutcome {
        match self.api.transcribe_file(&chunk.path).await {
            Ok(payload) => inspect_payload(chunk, payload),
            Err(e) if e.is_retryable() => AttemptOutcome::Retry(e.to_string()),
            Err(e) => AttemptOutcome::Fatal(e.to_string()),
        }
    }
}

#[async_trait]
impl<A: TranscriptionApi> ChunkTranscriber for TranscriberClient<A> {
    async fn transcribe(&self, chunk: &AudioChunk) -> ChunkResult {
        self.transcribe_chunk(chunk).await
    }
}

fn cached_payload_matches(payload: &VerboseTranscription, chunk: &AudioChunk) -> bool {
    if chunk.accelerated_duration <= 0.0 {
        return false;
    }
    let deviation =
        (payload.duration - chunk.accelerated_duration).abs() / chunk.accelerated_duration;
    deviation <= CACHE_DURATION_TOLERANCE
}

/// Silent-failure checks: a syntactically valid response can still be
/// semantically empty or degenerate, and those are retried like
/// transient errors.
fn inspect_payload(chunk: &AudioChunk, payload: VerboseTranscription) -> AttemptOutcome {
    if payload.segments.is_empty() {
        return AttemptOutcome::Retry("silent failure: response has no segments".to_string());
    }

    let text_len = payload.text.trim().chars().count();
    if text_len < 10 && payload.duration < 0.1 * chunk.accelerated_duration {
        return AttemptOutcome::Retry(format!(
            "silent failure: {} chars over {:.1}s reported for a {:.1}s chunk",
            text_len, payload.duration, chunk.accelerated_duration
        ));
    }

    if let Some(repeated) = find_repeated_run(&payload.segments) {
        return AttemptOutcome::Retry(format!(
            "hallucination: {} consecutive segments repeat {:?}",
            HALLUCINATION_RUN, repeated
        ));
    }

    AttemptOutcome::Accepted(payload)
}

/// NFKD, strip non-alphanumerics, lowercase, collapse whitespace.
fn normalize_text(text: &str) -> String {
    let decomposed: String = text.nfkd().collect();
    let stripped: String = decomposed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A run of `HALLUCINATION_RUN` consecutive segments with identical
/// normalized text of at least `HALLUCINATION_MIN_CHARS` characters.
fn find_repeated_run(segments: &[VerboseSegment]) -> Option<String> {
    let mut run_text = String::new();
    let mut run_len = 0usize;

    for segment in segments {
        let normalized = normalize_text(&segment.text);
        if run_len > 0 && normalized == run_text {
            run_len += 1;
        } else {
            run_text = normalized;
            run_len = 1;
        }
        if run_len >= HALLUCINATION_RUN && run_text.chars().count() >= HALLUCINATION_MIN_CHARS {
            return Some(run_text);
        }
    }

    None
}
