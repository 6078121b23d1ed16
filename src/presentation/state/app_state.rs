use std::sync::Arc;

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::application::services::{ImageSynthesisService, JobOrchestrator, VideoPostService};
use crate::presentation::config::Settings;

pub struct AppState<M, A, L, G>
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    pub orchestrator: Arc<JobOrchestrator<M, A>>,
    pub image_service: Arc<ImageSynthesisService<L, G>>,
    pub video_service: Arc<VideoPostService<M>>,
    pub settings: Arc<Settings>,
}

impl<M, A, L, G> Clone for AppState<M, A, L, G>
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            image_service: Arc::clone(&self.image_service),
            video_service: Arc::clone(&self.video_service),
            settings: Arc::clone(&self.settings),
        }
    }
}
