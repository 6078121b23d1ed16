use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct GenerateImageResponse {
    pub image_path: String,
    pub enhanced_prompt: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn generate_image_handler<M, A, L, G>(
    State(state): State<AppState<M, A, L, G>>,
    Json(request): Json<GenerateImageRequest>,
) -> Response
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Prompt must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    match state.image_service.generate(prompt).await {
        Ok(image) => (
            StatusCode::OK,
            Json(GenerateImageResponse {
                image_path: image.path.to_string_lossy().into_owned(),
                enhanced_prompt: image.enhanced_prompt,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Image generation failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
