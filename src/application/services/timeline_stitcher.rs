use std::collections::VecDeque;

use crate::domain::{ChunkResult, Segment};

#[derive(Debug, Clone)]
pub struct StitcherConfig {
    /// Chunk-boundary drift beyond this is flagged as a gap or overlap.
    pub boundary_tolerance_secs: f64,
    /// Emitted segments remembered for duplicate suppression.
    pub duplicate_lookback: usize,
    /// End-of-transcript drift against the source duration that trips
    /// the quality gate.
    pub drift_limit_secs: f64,
    /// Minimum segments per minute of source audio.
    pub min_density: f64,
    /// Failed-chunk share that trips the quality gate.
    pub max_failure_rate: f64,
}

impl Default for StitcherConfig {
    fn default() -> Self {
        Self {
            boundary_tolerance_secs: 1.0,
            duplicate_lookback: 3,
            drift_limit_secs: 60.0,
            min_density: 1.0,
            max_failure_rate: 0.3,
        }
    }
}

#[derive(Debug)]
pub struct StitchOutput {
    pub segments: Vec<Segment>,
    pub warnings: Vec<String>,
    pub failed_chunks: usize,
    pub quality_alert: bool,
}

/// Phase 5: map per-chunk service segments back onto the original
/// timeline and assemble one ordered transcript.
///
/// Service timestamps are accelerated seconds local to the chunk; a
/// segment lands at `start * factor + chunk.start_time`.
pub struct TimelineStitcher {
    config: StitcherConfig,
}

impl TimelineStitcher {
    pub fn new(config: StitcherConfig) -> Self {
        Self { config }
    }

    pub fn stitch(
        &self,
        results: &[ChunkResult],
        speed_factor: f64,
        original_duration: f64,
    ) -> StitchOutput {
        let mut ordered: Vec<&ChunkResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.index);

        let mut segments: Vec<Segment> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut recent: VecDeque<String> = VecDeque::new();
        let mut last_end_time = 0.0f64;
        let mut failed_chunks = 0usize;

        for result in &ordered {
            let drift = result.chunk.start_time - last_end_time;
            if drift.abs() > self.config.boundary_tolerance_secs {
                if drift > 0.0 {
                    warnings.push(format!(
                        "GAP: {:.2}s of audio unaccounted for before chunk {} (at {:.2}s)",
                        drift, result.index, result.chunk.start_time
                    ));
                } else {
                    warnings.push(format!(
                        "OVERLAP: chunk {} starts {:.2}s before the previous chunk ended (at {:.2}s)",
                        result.index,
                        -drift,
                        result.chunk.start_time
                    ));
                }
            }

            if !result.success {
                failed_chunks += 1;
                warnings.push(format!(
                    "CHUNK_FAILED: chunk {} covering {:.2}s-{:.2}s failed after {} retries: {}",
                    result.index,
                    result.chunk.start_time,
                    result.chunk.end_time(),
                    result.retries,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
                last_end_time = result.chunk.end_time();
                continue;
            }

            for service_segment in &result.segments {
                let text = service_segment.text.trim();
                if text.is_empty() {
                    continue;
                }

                if recent.iter().any(|prev| prev == text) {
                    warnings.push(format!(
                        "DUPLICATE: segment text repeated in chunk {} at {:.2}s; dropped as a hallucination echo",
                        result.index,
                        service_segment.start * speed_factor + result.chunk.start_time
                    ));
                    continue;
                }

                let mut start = service_segment.start * speed_factor + result.chunk.start_time;
                let mut end = service_segment.end * speed_factor + result.chunk.start_time;
                // Keep starts and ends non-decreasing, and ends at or
                // after their own starts.
                if let Some(prev) = segments.last() {
                    start = start.max(prev.start);
                    end = end.max(prev.end);
                }
                end = end.max(start);

                segments.push(Segment {
                    index: segments.len() + 1,
                    start,
                    end,
                    text: text.to_string(),
                });
                last_end_time = end;

                recent.push_back(text.to_string());
                while recent.len() > self.config.duplicate_lookback {
                    recent.pop_front();
                }
            }
        }

        let quality_alert = self.quality_gate(
            &segments,
            &mut warnings,
            last_end_time,
            original_duration,
            failed_chunks,
            ordered.len(),
        );

        StitchOutput {
            segments,
            warnings,
            failed_chunks,
            quality_alert,
        }
    }

    fn quality_gate(
        &self,
        segments: &[Segment],
        warnings: &mut Vec<String>,
        last_end_time: f64,
        original_duration: f64,
        failed_chunks: usize,
        total_chunks: usize,
    ) -> bool {
        let mut problems = Vec::new();

        let drift = (original_duration - last_end_time).abs();
        if drift > self.config.drift_limit_secs {
            problems.push(format!(
                "transcript ends {:.0}s away from the {:.0}s source",
                drift, original_duration
            ));
        }

        let minutes = original_duration / 60.0;
        if minutes > 0.0 {
            let density = segments.len() as f64 / minutes;
            if density < self.config.min_density {
                problems.push(format!(
                    "segment density {:.2}/min is below {:.1}/min",
                    density, self.config.min_density
                ));
            }
        }

        if total_chunks > 0 {
            let failure_rate = failed_chunks as f64 / total_chunks as f64;
            if failure_rate > self.config.max_failure_rate {
                problems.push(format!(
                    "{} of {} chunks failed ({:.0}%)",
                    failed_chunks,
                    total_chunks,
                    failure_rate * 100.0
                ));
            }
        }

        if problems.is_empty() {
            return false;
        }
        warnings.push(format!("QUALITY_ALERT: {}", problems.join("; ")));
        true
    }
}

impl Default for TimelineStitcher {
    fn default() -> Self {
        Self::new(StitcherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioChunk, ServiceSegment};
    use std::path::PathBuf;

    fn chunk(index: usize, start: f64, duration: f64, factor: f64) -> AudioChunk {
        AudioChunk {
            index,
            path: PathBuf::from(format!("chunk_{:03}.mp3", index)),
            start_time: start,
            duration,
            accelerated_duration: duration / factor,
        }
    }

    fn seg(start: f64, end: f64, text: &str) -> ServiceSegment {
        ServiceSegment {
            start,
            end,
            text: text.to_string(),
        }
    }

    fn ok_result(c: AudioChunk, segments: Vec<ServiceSegment>) -> ChunkResult {
        ChunkResult::succeeded(c, segments, 0.0, 0)
    }

    #[test]
    fn remaps_service_times_onto_the_original_timeline() {
        // Segment (3.0, 5.0) on a chunk starting at 100s with factor 2
        // lands at (106.0, 110.0).
        let results = vec![ok_result(
            chunk(1, 100.0, 40.0, 2.0),
            vec![seg(3.0, 5.0, "hello")],
        )];

        let out = TimelineStitcher::default().stitch(&results, 2.0, 140.0);

        assert_eq!(out.segments.len(), 1);
        assert!((out.segments[0].start - 106.0).abs() < 0.001);
        assert!((out.segments[0].end - 110.0).abs() < 0.001);
    }

    #[test]
    fn consecutive_duplicates_collapse_to_one() {
        let results = vec![ok_result(
            chunk(1, 0.0, 20.0, 2.0),
            vec![
                seg(0.0, 2.0, "ok ok"),
                seg(2.0, 4.0, "ok ok"),
                seg(4.0, 6.0, "ok ok"),
                seg(6.0, 8.0, "ok ok"),
            ],
        )];

        let out = TimelineStitcher::default().stitch(&results, 2.0, 20.0);

        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].text, "ok ok");
        assert_eq!(
            out.warnings
                .iter()
                .filter(|w| w.starts_with("DUPLICATE"))
                .count(),
            3
        );
    }

    #[test]
    fn failed_chunk_advances_the_timeline_and_warns() {
        let results = vec![
            ok_result(chunk(1, 0.0, 30.0, 2.0), vec![seg(0.0, 15.0, "first part")]),
            ChunkResult::failed(chunk(2, 30.0, 30.0, 2.0), "upstream 502".into(), 5, false),
            ok_result(chunk(3, 60.0, 30.0, 2.0), vec![seg(0.0, 15.0, "third part")]),
        ];

        let out = TimelineStitcher::default().stitch(&results, 2.0, 90.0);

        assert_eq!(out.segments.len(), 2);
        assert_eq!(out.failed_chunks, 1);
        let failure = out
            .warnings
            .iter()
            .find(|w| w.starts_with("CHUNK_FAILED"))
            .unwrap();
        assert!(failure.contains("30.00s-60.00s"));
        // Chunk 3 starts exactly where the failed span ended: no gap.
        assert!(!out.warnings.iter().any(|w| w.starts_with("GAP")));
    }

    #[test]
    fn gap_between_chunks_is_reported() {
        let results = vec![
            ok_result(chunk(1, 0.0, 10.0, 1.0), vec![seg(0.0, 10.0, "first")]),
            ok_result(chunk(2, 25.0, 10.0, 1.0), vec![seg(0.0, 10.0, "second")]),
        ];

        let out = TimelineStitcher::default().stitch(&results, 1.0, 35.0);

        assert!(out.warnings.iter().any(|w| w.starts_with("GAP")));
    }

    #[test]
    fn out_of_order_service_segments_keep_times_monotonic() {
        let results = vec![ok_result(
            chunk(1, 0.0, 20.0, 1.0),
            vec![
                seg(5.0, 8.0, "later text first"),
                seg(1.0, 3.0, "out of order"),
            ],
        )];

        let out = TimelineStitcher::default().stitch(&results, 1.0, 20.0);

        assert_eq!(out.segments.len(), 2);
        for pair in out.segments.windows(2) {
            assert!(pair[1].start >= pair[0].start);
            assert!(pair[1].end >= pair[0].end);
        }
        for s in &out.segments {
            assert!(s.end >= s.start);
        }
        // The second segment is pinned to the first one's times.
        assert!((out.segments[1].start - 5.0).abs() < 1e-9);
        assert!((out.segments[1].end - 8.0).abs() < 1e-9);
    }

    #[test]
    fn heavy_failure_rate_trips_the_quality_gate() {
        let results = vec![
            ok_result(chunk(1, 0.0, 60.0, 2.0), vec![seg(0.0, 30.0, "only text")]),
            ChunkResult::failed(chunk(2, 60.0, 60.0, 2.0), "err".into(), 5, false),
            ChunkResult::failed(chunk(3, 120.0, 60.0, 2.0), "err".into(), 5, false),
        ];

        let out = TimelineStitcher::default().stitch(&results, 2.0, 180.0);

        assert!(out.quality_alert);
        assert!(out.warnings.iter().any(|w| w.starts_with("QUALITY_ALERT")));
    }

    #[test]
    fn clean_single_chunk_raises_no_alert() {
        let results = vec![ok_result(
            chunk(1, 0.0, 12.0, 2.0),
            vec![seg(0.0, 3.0, "hello there"), seg(3.0, 6.0, "general remarks")],
        )];

        let out = TimelineStitcher::default().stitch(&results, 2.0, 12.0);

        assert!(!out.quality_alert);
        assert!(out.warnings.is_empty());
        assert_eq!(out.segments.last().unwrap().index, 2);
    }
}
