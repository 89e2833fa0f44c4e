//! Wire and cache types

use serde::{Deserialize, Serialize};

/// A generated document in the user's list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default)]
    pub text: String,
}

/// `POST /ocr` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub text: String,
    pub docx_url: String,
    #[serde(default)]
    pub doc_path: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// Error body the server sends with non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}
