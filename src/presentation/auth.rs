use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// When unset, the middleware admits every request.
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct AuthErrorResponse {
    error: String,
}

/// Accepts either an `X-API-Key` header or a bearer token matching the
/// configured secret.
pub async fn api_key_middleware(
    State(config): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = config.api_key.as_deref() else {
        return next.run(request).await;
    };

    let headers = request.headers();
    let key_header = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if key_header == Some(expected) || bearer == Some(expected) {
        return next.run(request).await;
    }

    tracing::warn!(uri = %request.uri().path(), "Rejected request with missing or bad API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            error: "Missing or invalid API key".to_string(),
        }),
    )
        .into_response()
}
