use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::domain::{JobId, JobPaths};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub exists: bool,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status is derived purely from on-disk state: a working directory
/// means the job is processing; artifacts without one mean it finished.
#[tracing::instrument(skip(state))]
pub async fn job_status_handler<M, A, L, G>(
    State(state): State<AppState<M, A, L, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    let paths = JobPaths::new(
        &state.settings.storage.temp_dir,
        &state.settings.storage.output_dir,
        JobId::from_uuid(uuid),
    );

    let processing = tokio::fs::metadata(paths.work_dir()).await.is_ok();
    let finished = tokio::fs::metadata(paths.output_dir()).await.is_ok();

    let response = if processing {
        JobStatusResponse {
            exists: true,
            completed: false,
        }
    } else if finished {
        JobStatusResponse {
            exists: true,
            completed: true,
        }
    } else {
        JobStatusResponse {
            exists: false,
            completed: false,
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}
