use std::path::PathBuf;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::application::services::VideoPostError;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct BurnSubtitlesRequest {
    pub video_path: String,
    pub subtitle_path: String,
}

#[derive(Deserialize)]
pub struct ImageToVideoRequest {
    pub image_path: String,
    #[serde(default = "default_clip_secs")]
    pub duration_secs: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_clip_secs() -> f64 {
    5.0
}

fn default_zoom() -> f64 {
    1.2
}

#[derive(Serialize)]
pub struct VideoResponse {
    pub output_path: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn map_error(e: VideoPostError) -> Response {
    let status = match &e {
        VideoPostError::MissingInput(_) | VideoPostError::InvalidParameter(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

pub async fn burn_subtitles_handler<M, A, L, G>(
    State(state): State<AppState<M, A, L, G>>,
    Json(request): Json<BurnSubtitlesRequest>,
) -> Response
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .video_service
        .burn_subtitles(
            &PathBuf::from(&request.video_path),
            &PathBuf::from(&request.subtitle_path),
        )
        .await
    {
        Ok(output) => (
            StatusCode::OK,
            Json(VideoResponse {
                output_path: output.to_string_lossy().into_owned(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Subtitle burn-in failed");
            map_error(e)
        }
    }
}

pub async fn image_to_video_handler<M, A, L, G>(
    State(state): State<AppState<M, A, L, G>>,
    Json(request): Json<ImageToVideoRequest>,
) -> Response
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .video_service
        .image_to_video(
            &PathBuf::from(&request.image_path),
            request.duration_secs,
            request.zoom,
        )
        .await
    {
        Ok(output) => (
            StatusCode::OK,
            Json(VideoResponse {
                output_path: output.to_string_lossy().into_owned(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Image-to-video failed");
            map_error(e)
        }
    }
}
