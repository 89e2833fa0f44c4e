//! File serving routes
//!
//! Serves generated documents from the output directory.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new().route("/*path", get(serve_file))
}

/// Serve a generated file
async fn serve_file(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let file_path = state
        .storage()
        .resolve_document(&path)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid file path: {}", path)))?;

    let bytes = match tokio::fs::read(&file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("File not found: {}", path)));
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = mime_guess::from_path(&file_path).first_or_octet_stream();
    let filename = path.rsplit('/').next().unwrap_or(&path);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
