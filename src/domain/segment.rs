use serde::Serialize;

/// A transcript segment on the original timeline.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// 1-based across the final transcript.
    pub index: usize,
    /// Original-timeline seconds, non-decreasing across the transcript.
    pub start: f64,
    /// Original-timeline seconds, `end >= start`.
    pub end: f64,
    /// Trimmed, non-empty.
    pub text: String,
}

/// A segment as reported by the transcription service: times are local to
/// the submitted chunk and on the accelerated timeline.
#[derive(Debug, Clone)]
pub struct ServiceSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
