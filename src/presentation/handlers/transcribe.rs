use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{ImageGenerator, LlmClient, MediaProcessor, TranscriptionApi};
use crate::application::services::{transcript_formatter, JobError};
use crate::domain::{JobId, JobPaths, OutputFormat};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

fn error_response(status: StatusCode, error: String, job_id: Option<String>) -> Response {
    (status, Json(ErrorResponse { error, job_id })).into_response()
}

struct StagedUpload {
    paths: JobPaths,
    source: PathBuf,
}

pub async fn transcribe_handler<M, A, L, G>(
    State(state): State<AppState<M, A, L, G>>,
    mut multipart: Multipart,
) -> Response
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    let mut speed: Option<f64> = None;
    let mut format: Option<OutputFormat> = None;
    let mut staged: Option<StagedUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                discard_staged(&staged).await;
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart body: {}", e),
                    None,
                );
            }
        };

        match field.name() {
            Some("audio") if staged.is_none() => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let extension = Path::new(&filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase())
                    .unwrap_or_default();

                if !state.settings.is_allowed_audio_format(&extension) {
                    tracing::warn!(filename = %filename, "Rejected unsupported audio format");
                    return error_response(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        format!(
                            "Unsupported audio format: {:?}. Allowed: {}",
                            extension,
                            state.settings.transcription.allowed_audio_formats.join(", ")
                        ),
                        None,
                    );
                }

                let paths = JobPaths::new(
                    &state.settings.storage.temp_dir,
                    &state.settings.storage.output_dir,
                    JobId::new(),
                );
                match stage_audio_field(&state, &paths, &extension, field).await {
                    Ok(source) => staged = Some(StagedUpload { paths, source }),
                    Err(response) => {
                        let _ = tokio::fs::remove_dir_all(paths.work_dir()).await;
                        return response;
                    }
                }
            }
            Some("speed") => match read_text_field(field).await {
                Ok(text) => match text.trim().parse::<f64>() {
                    Ok(value) => speed = Some(state.settings.clamp_speed(value)),
                    Err(_) => {
                        discard_staged(&staged).await;
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Invalid speed: {:?}", text),
                            None,
                        );
                    }
                },
                Err(response) => {
                    discard_staged(&staged).await;
                    return response;
                }
            },
            Some("format") => match read_text_field(field).await {
                Ok(text) => match text.trim().parse::<OutputFormat>() {
                    Ok(value) => format = Some(value),
                    Err(e) => {
                        discard_staged(&staged).await;
                        return error_response(StatusCode::BAD_REQUEST, e, None);
                    }
                },
                Err(response) => {
                    discard_staged(&staged).await;
                    return response;
                }
            },
            _ => {}
        }
    }

    let Some(upload) = staged else {
        tracing::warn!("Transcription request with no audio field");
        return error_response(
            StatusCode::BAD_REQUEST,
            "No audio file uploaded".to_string(),
            None,
        );
    };

    let speed = speed.unwrap_or_else(|| state.settings.clamp_speed(state.settings.transcription.speed_factor));
    let format = format.unwrap_or_default();
    let job_id = upload.paths.id().to_string();

    tracing::info!(
        job_id = %job_id,
        speed,
        format = %format,
        "Transcription job accepted"
    );

    match state
        .orchestrator
        .run(&upload.paths, &upload.source, speed, format)
        .await
    {
        Ok(result) => match format {
            OutputFormat::Json => (StatusCode::OK, Json(result)).into_response(),
            OutputFormat::Srt => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                transcript_formatter::to_srt(&result.transcript.segments),
            )
                .into_response(),
            OutputFormat::Txt => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                result.transcript.full_text,
            )
                .into_response(),
        },
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Transcription job failed");
            let status = if e.is_client_error() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                match &e {
                    JobError::AllChunksFailed(_, _) => StatusCode::BAD_GATEWAY,
                    JobError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                }
            };
            error_response(status, e.to_string(), Some(job_id))
        }
    }
}

/// Stream the upload to the job's working directory, enforcing the size
/// cap as bytes arrive rather than buffering the whole body.
async fn stage_audio_field<M, A, L, G>(
    state: &AppState<M, A, L, G>,
    paths: &JobPaths,
    extension: &str,
    mut field: axum::extract::multipart::Field<'_>,
) -> Result<PathBuf, Response>
where
    M: MediaProcessor + 'static,
    A: TranscriptionApi + 'static,
    L: LlmClient + 'static,
    G: ImageGenerator + 'static,
{
    let cap = state.settings.max_file_size_bytes();
    let source = paths.source_path(extension);

    if let Err(e) = tokio::fs::create_dir_all(paths.work_dir()).await {
        tracing::error!(error = %e, "Failed to create job working directory");
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stage upload: {}", e),
            None,
        ));
    }

    let mut file = match tokio::fs::File::create(&source).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create staging file");
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to stage upload: {}", e),
                None,
            ));
        }
    };

    let mut total: u64 = 0;
    loop {
        match field.chunk().await {
            Ok(Some(bytes)) => {
                total += bytes.len() as u64;
                if total > cap {
                    return Err(error_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!(
                            "File exceeds the {} MB upload cap",
                            state.settings.transcription.max_file_size_mb
                        ),
                        None,
                    ));
                }
                if let Err(e) = file.write_all(&bytes).await {
                    return Err(error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to stage upload: {}", e),
                        None,
                    ));
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload: {}", e),
                    None,
                ));
            }
        }
    }

    if total == 0 {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Uploaded audio file is empty".to_string(),
            None,
        ));
    }
    if let Err(e) = file.flush().await {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stage upload: {}", e),
            None,
        ));
    }

    tracing::debug!(bytes = total, path = %source.display(), "Upload staged");
    Ok(source)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    field.text().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Failed to read field: {}", e),
            None,
        )
    })
}

async fn discard_staged(staged: &Option<StagedUpload>) {
    if let Some(upload) = staged {
        let _ = tokio::fs::remove_dir_all(upload.paths.work_dir()).await;
    }
}
