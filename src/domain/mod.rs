mod audio_chunk;
mod chunk_result;
mod job;
mod job_paths;
mod job_status;
mod output_format;
mod segment;
mod silence;
mod transcript;

pub use audio_chunk::AudioChunk;
pub use chunk_result::ChunkResult;
pub use job::{JobId, TranscriptionJob};
pub use job_paths::JobPaths;
pub use job_status::JobStatus;
pub use output_format::OutputFormat;
pub use segment::{Segment, ServiceSegment};
pub use silence::SilenceSpan;
pub use transcript::{ArtifactPaths, JobSnapshot, Transcript, TranscriptionResult};
