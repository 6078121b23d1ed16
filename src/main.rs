use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use quickscribe::application::services::{
    BatchCoordinatorConfig, ChunkPlannerConfig, ImageSynthesisService, JobOrchestrator,
    JobOrchestratorConfig, RetryPolicy, SilenceDetectionConfig, StitcherConfig, VideoPostService,
};
use quickscribe::infrastructure::cleanup::{spawn_sweeper, SweeperConfig};
use quickscribe::infrastructure::media::{check_ffmpeg_binary, FfmpegProcessor};
use quickscribe::infrastructure::observability::{init_tracing, TracingConfig};
use quickscribe::infrastructure::openai::{OpenAiChatClient, OpenAiImageClient};
use quickscribe::infrastructure::transcription::WhisperApiClient;
use quickscribe::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Arc::new(Settings::from_env());

    init_tracing(
        TracingConfig::from_env(settings.environment.to_string()),
        settings.server.port,
    );

    if let Err(e) = check_ffmpeg_binary() {
        tracing::warn!(error = %e, "ffmpeg unavailable; media operations will fail until installed");
    }

    let media = Arc::new(FfmpegProcessor::new());

    let api = Arc::new(WhisperApiClient::new(
        settings.transcription.api_key.clone(),
        settings.transcription.base_url.clone(),
        Some(settings.transcription.model.clone()),
        Duration::from_millis(settings.transcription.request_timeout_ms),
    )?);

    let orchestrator_config = JobOrchestratorConfig {
        retry_policy: RetryPolicy {
            max_retries: settings.transcription.max_retries,
            initial_delay: Duration::from_millis(settings.transcription.initial_retry_delay_ms),
            max_delay: Duration::from_secs(30),
        },
        coordinator: BatchCoordinatorConfig {
            concurrency: settings.transcription.concurrent_chunks,
            global_attempts: 3,
        },
        planner: ChunkPlannerConfig {
            target_chunk_secs: settings.transcription.chunk_time_secs,
            silence_window_secs: settings.silence.window_secs,
            min_chunk_secs: settings.silence.min_chunk_secs,
            ..ChunkPlannerConfig::default()
        },
        stitcher: StitcherConfig::default(),
        silence: settings.silence.enabled.then(|| SilenceDetectionConfig {
            threshold_db: settings.silence.threshold_db,
            min_duration_secs: settings.silence.min_silence_secs,
        }),
        soft_deadline: settings
            .transcription
            .job_deadline_secs
            .map(Duration::from_secs),
        cleanup_delay: Duration::from_secs(300),
    };

    let orchestrator = Arc::new(JobOrchestrator::new(
        Arc::clone(&media),
        api,
        orchestrator_config,
    ));

    let llm = Arc::new(OpenAiChatClient::new(
        settings.image.api_key.clone(),
        settings.image.base_url.clone(),
        settings.image.chat_model.clone(),
        Duration::from_millis(settings.image.request_timeout_ms),
    )?);
    let image_generator = Arc::new(OpenAiImageClient::new(
        settings.image.api_key.clone(),
        settings.image.base_url.clone(),
        settings.image.image_model.clone(),
        Duration::from_millis(settings.image.request_timeout_ms),
    )?);
    let image_service = Arc::new(ImageSynthesisService::new(
        llm,
        image_generator,
        settings.storage.output_dir.join("images"),
    ));
    let video_service = Arc::new(VideoPostService::new(
        Arc::clone(&media),
        settings.storage.output_dir.join("videos"),
    ));

    spawn_sweeper(SweeperConfig {
        roots: vec![
            settings.storage.temp_dir.clone(),
            settings.storage.output_dir.clone(),
        ],
        max_age: Duration::from_secs(settings.storage.temp_file_max_age_hours * 3600),
        interval: Duration::from_secs(3600),
    });

    let state = AppState {
        orchestrator,
        image_service,
        video_service,
        settings: Arc::clone(&settings),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
