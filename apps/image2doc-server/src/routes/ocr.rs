//! Image upload route
//!
//! `POST /ocr` takes a multipart form with a `file` part (plus optional
//! `userId` and `name`), runs it through the ingest pipeline and answers
//! with the recognized text and a link to the generated `.docx`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::db::{default_document_name, DocumentRepository, NewDocument};
use crate::error::ErrorResponse;
use crate::ingest::{IngestError, IngestRequest};
use crate::state::AppState;

/// Used when neither the file name nor the content type names a format
const FALLBACK_EXTENSION: &str = "jpg";

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Successful conversion
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub text: String,
    pub docx_url: String,
    /// Server-relative path of the generated file
    pub doc_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Create the OCR router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/ocr", post(ocr_upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Fields collected from the multipart form
#[derive(Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    extension: Option<String>,
    user_id: Option<String>,
    name: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ErrorReply> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        (
            e.status(),
            Json(ErrorResponse::new(format!("Failed to read upload: {}", e.body_text()))),
        )
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                form.extension = Some(upload_extension(field.file_name(), field.content_type()));
                let data = field.bytes().await.map_err(|e| {
                    tracing::warn!("Failed to read file data: {}", e);
                    (
                        e.status(),
                        Json(ErrorResponse::new(format!(
                            "Failed to read file data: {}",
                            e.body_text()
                        ))),
                    )
                })?;
                tracing::debug!("Read {} bytes of file data", data.len());
                form.file = Some(data.to_vec());
            }
            "userId" | "name" => {
                let value = field.text().await.map_err(|e| {
                    tracing::warn!("Failed to read form field '{}': {}", field_name, e);
                    (
                        e.status(),
                        Json(ErrorResponse::new(format!(
                            "Failed to read field {}: {}",
                            field_name,
                            e.body_text()
                        ))),
                    )
                })?;
                let value = value.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                if field_name == "userId" {
                    form.user_id = Some(value);
                } else {
                    form.name = Some(value);
                }
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

/// Convert an uploaded image to a Word document
async fn ocr_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ErrorReply> {
    let form = read_form(multipart).await?;

    let data = form.file.ok_or_else(|| ingest_error_reply(IngestError::NoFile))?;
    let title = form
        .name
        .clone()
        .unwrap_or_else(|| default_document_name(Utc::now()));

    let outcome = state
        .pipeline()
        .run(IngestRequest {
            data,
            extension: form.extension.unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
            title: Some(title),
        })
        .await
        .map_err(ingest_error_reply)?;

    let document_id = match form.user_id {
        Some(ref user_id) => {
            let record = DocumentRepository::new(state.db())
                .create(&NewDocument {
                    user_id,
                    name: form.name.as_deref(),
                    url: &outcome.document.url,
                    file_name: &outcome.document.file_name,
                    text: &outcome.text,
                })
                .await;

            match record {
                Ok(record) => Some(record.id),
                Err(e) => {
                    // The generated file has no owner without its row
                    if let Err(remove_err) =
                        state.storage().remove_document(&outcome.document.file_name).await
                    {
                        tracing::warn!(
                            file = %outcome.document.file_name,
                            "Failed to remove unrecorded document: {}",
                            remove_err
                        );
                    }
                    return Err(ingest_error_reply(IngestError::Database(e.to_string())));
                }
            }
        }
        None => None,
    };

    Ok(Json(OcrResponse {
        doc_path: format!("/files/{}", outcome.document.file_name),
        docx_url: outcome.document.url,
        text: outcome.text,
        document_id,
    }))
}

/// Everything but a missing file collapses to a generic 500
fn ingest_error_reply(err: IngestError) -> ErrorReply {
    match err {
        IngestError::NoFile => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No file uploaded")),
        ),
        err => {
            tracing::error!(stage = %err.stage(), "OCR request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_debug_details("OCR failed", &err)),
            )
        }
    }
}

/// Extension from the part's file name, else from its content type
fn upload_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .or_else(|| {
            content_type
                .and_then(mime_guess::get_mime_extensions_str)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
