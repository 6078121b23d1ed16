mod batch_coordinator;
mod chunk_cache;
mod chunk_planner;
mod image_synthesis;
mod job_orchestrator;
mod media_transform;
mod timeline_stitcher;
mod transcriber_client;
pub mod transcript_formatter;
mod video_post;

pub use batch_coordinator::{BatchCoordinator, BatchCoordinatorConfig};
pub use chunk_cache::{ChunkCache, ChunkCacheError};
pub use chunk_planner::{ChunkPlan, ChunkPlanner, ChunkPlannerConfig, ChunkPlannerError};
pub use image_synthesis::{GeneratedImage, ImageSynthesisError, ImageSynthesisService};
pub use job_orchestrator::{
    JobError, JobOrchestrator, JobOrchestratorConfig, SilenceDetectionConfig,
};
pub use media_transform::{AcceleratedAudio, MediaTransformError, MediaTransformService};
pub use timeline_stitcher::{StitchOutput, StitcherConfig, TimelineStitcher};
pub use transcriber_client::{RetryPolicy, TranscriberClient};
pub use video_post::{VideoPostError, VideoPostService};
