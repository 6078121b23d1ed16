use std::path::PathBuf;

/// A contiguous slice of the source audio, cut on the accelerated working
/// file but indexed on the original timeline. Immutable after planning.
///
/// Adjacent chunks satisfy `start_time + duration == next.start_time`
/// within floating tolerance, and durations sum to the source duration.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// 1-based, contiguous across the plan.
    pub index: usize,
    /// Encoded chunk file on disk.
    pub path: PathBuf,
    /// Start offset in original-timeline seconds.
    pub start_time: f64,
    /// Length in original-timeline seconds.
    pub duration: f64,
    /// Length of the physical (accelerated) chunk file in seconds.
    pub accelerated_duration: f64,
}

impl AudioChunk {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}
