//! HTTP control surface.
//!
//! Runs on its own tokio runtime; never touches the session directly.
//! Control operations cross the blocking `ControlHandle` (serviced inside
//! the scheduler loop), so every handler that talks to the recorder runs
//! on the blocking pool. File operations are pass-through against storage.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;

use crate::control::ControlHandle;
use crate::recorder::RecordingError;
use crate::storage::{BlockStorage, StdStorage};

#[derive(Clone)]
pub struct HttpState {
    control: ControlHandle,
    storage: StdStorage,
}

impl HttpState {
    pub fn new(control: ControlHandle, storage: StdStorage) -> Self {
        Self { control, storage }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/record/start", post(api_start))
        .route("/api/record/stop", post(api_stop))
        .route("/api/preview", get(api_preview))
        .route("/api/videos", get(api_videos))
        .route(
            "/api/videos/{name}",
            get(api_download).delete(api_delete),
        )
        .with_state(state)
}

pub async fn serve(addr: std::net::SocketAddr, state: HttpState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(target: "http", "control surface listening on {}", addr);
    axum::serve(listener, router(state)).await
}

async fn api_status(State(state): State<HttpState>) -> Response {
    match spawn_blocking(move || state.control.status()).await {
        Ok(Ok(snapshot)) => Json(snapshot).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "recorder task failed").into_response(),
    }
}

async fn api_start(State(state): State<HttpState>) -> Response {
    match spawn_blocking(move || state.control.start()).await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "recorder task failed").into_response(),
    }
}

async fn api_stop(State(state): State<HttpState>) -> Response {
    match spawn_blocking(move || state.control.stop()).await {
        Ok(Ok(summary)) => Json(summary).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "recorder task failed").into_response(),
    }
}

async fn api_preview(State(state): State<HttpState>) -> Response {
    match spawn_blocking(move || state.control.preview()).await {
        Ok(Some(jpeg)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/jpeg")],
            jpeg,
        )
            .into_response(),
        Ok(None) => (StatusCode::SERVICE_UNAVAILABLE, "no frame ready").into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "recorder task failed").into_response(),
    }
}

async fn api_videos(State(state): State<HttpState>) -> Response {
    match state.storage.list() {
        Ok(files) => Json(files).into_response(),
        Err(e) => {
            tracing::error!(target: "http", "listing failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

async fn api_download(State(state): State<HttpState>, Path(name): Path<String>) -> Response {
    let Some(name) = sanitize(&name) else {
        return (StatusCode::BAD_REQUEST, "invalid file name").into_response();
    };
    if !state.storage.exists(&name) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.storage.read(&name) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "video/x-msvideo".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(target: "http", "download of {} failed: {}", name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn api_delete(State(state): State<HttpState>, Path(name): Path<String>) -> Response {
    let Some(name) = sanitize(&name) else {
        return (StatusCode::BAD_REQUEST, "invalid file name").into_response();
    };
    if state.storage.remove(&name) {
        tracing::info!(target: "http", "deleted {}", name);
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Accepts plain file names only; anything path-like is rejected.
fn sanitize(name: &str) -> Option<String> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name.to_string())
}

fn error_response(error: &RecordingError) -> Response {
    let status = match error {
        RecordingError::NotRecording => StatusCode::CONFLICT,
        RecordingError::StorageUnavailable(_) | RecordingError::ControlUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RecordingError::HeaderWriteFailed(_)
        | RecordingError::WriteFailed(_)
        | RecordingError::FinalizeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
