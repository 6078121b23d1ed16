use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::auth::{api_key_middleware, AuthConfig};
use crate::presentation::handlers::{
    burn_subtitles_handler, generate_image_handler, health_handler, image_to_video_handler,
    job_status_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<M, A, L, G>(state: AppState<M, A, L, G>) -> Router
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let auth = AuthConfig {
        api_key: state.settings.auth.api_key.clone(),
    };
    // Uploads stream to disk; allow the configured cap plus form overhead.
    let body_limit = state.settings.max_file_size_bytes() as usize + 1024 * 1024;

    let protected = Router::new()
        .route("/transcribe", post(transcribe_handler::<M, A, L, G>))
        .route("/status/{job_id}", get(job_status_handler::<M, A, L, G>))
        .route("/generate-image", post(generate_image_handler::<M, A, L, G>))
        .route(
            "/video/burn-subtitles",
            post(burn_subtitles_handler::<M, A, L, G>),
        )
        .route(
            "/video/image-to-video",
            post(image_to_video_handler::<M, A, L, G>),
        )
        .route_layer(middleware::from_fn_with_state(auth, api_key_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
