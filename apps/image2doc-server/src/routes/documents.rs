//! Document list routes
//!
//! Per-user listing, rename and delete of generated documents. The
//! `userId` is asserted by the client and only scopes the queries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Document, DocumentRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Document as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub uploaded_at: String,
    pub text: String,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            url: doc.url,
            uploaded_at: doc.uploaded_at,
            text: doc.text,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub name: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub user_id: Option<String>,
}

/// Create the documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents/:id", patch(rename_document).delete(delete_document))
}

fn require_user(user_id: Option<String>) -> Result<String> {
    user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))
}

/// List a user's documents, newest first
async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<DocumentResponse>>> {
    let user_id = require_user(query.user_id)?;
    let documents = DocumentRepository::new(state.db())
        .list_for_user(&user_id)
        .await?;

    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

/// Rename a document
async fn rename_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<RenameRequest>,
) -> Result<Json<DocumentResponse>> {
    let user_id = require_user(data.user_id)?;
    let name = data
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("name must not be blank".to_string()))?;

    let document = DocumentRepository::new(state.db())
        .rename(&id, &user_id, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))?;

    tracing::info!(id = %id, name = %name, "Document renamed");
    Ok(Json(document.into()))
}

/// Delete a document and its generated file
///
/// `userId` may come in the JSON body or the query string.
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
    body: Option<Json<DeleteRequest>>,
) -> Result<StatusCode> {
    let user_id = require_user(body.and_then(|Json(b)| b.user_id).or(query.user_id))?;

    let document = DocumentRepository::new(state.db())
        .delete(&id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))?;

    if let Err(e) = state.storage().remove_document(&document.file_name).await {
        tracing::warn!(file = %document.file_name, "Failed to remove generated file: {}", e);
    }

    tracing::info!(id = %id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
