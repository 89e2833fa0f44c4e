//! HTTP client for the Image2Doc server

use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Response};
use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{DocumentItem, ErrorBody, OcrResponse};

/// Local file header signature every `.docx` starts with
pub const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Document list operations the store depends on
#[async_trait]
pub trait DocumentsApi: Send + Sync {
    async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentItem>>;

    async fn rename_document(&self, user_id: &str, id: &str, name: &str) -> Result<DocumentItem>;

    async fn delete_document(&self, user_id: &str, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.resolve(path)
    }

    /// Upload a JPEG for recognition
    pub async fn upload_image(
        &self,
        jpeg: Vec<u8>,
        file_name: &str,
        user_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<OcrResponse> {
        let part = multipart::Part::bytes(jpeg)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(user_id) = user_id {
            form = form.text("userId", user_id.to_string());
        }
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }

        tracing::debug!(url = %self.url("/ocr"), "Uploading image");
        let response = self.http.post(self.url("/ocr")).multipart(form).send().await?;
        let response = check_status(response).await?;

        Ok(response.json::<OcrResponse>().await?)
    }

    /// Fetch a generated document and write it to `out`.
    ///
    /// Returns the number of bytes written.
    pub async fn download(&self, url: &str, out: &Path) -> Result<u64> {
        let response = self.http.get(self.url(url)).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;

        if !bytes.starts_with(ZIP_SIGNATURE) {
            return Err(ClientError::InvalidDocument(format!(
                "{} did not return a ZIP container ({} bytes)",
                url,
                bytes.len()
            )));
        }

        tokio::fs::write(out, &bytes).await?;
        tracing::info!(path = %out.display(), bytes = bytes.len(), "Document saved");
        Ok(bytes.len() as u64)
    }
}

#[async_trait]
impl DocumentsApi for ApiClient {
    async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentItem>> {
        let response = self
            .http
            .get(self.url("/documents"))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn rename_document(&self, user_id: &str, id: &str, name: &str) -> Result<DocumentItem> {
        let response = self
            .http
            .patch(self.url(&format!("/documents/{}", id)))
            .json(&json!({ "name": name, "userId": user_id }))
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn delete_document(&self, user_id: &str, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/documents/{}", id)))
            .json(&json!({ "userId": user_id }))
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}

/// Turn any non-2xx response into [`ClientError::Server`]
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    tracing::warn!(status = status.as_u16(), "Server error: {}", message);
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => Some(format!("{} ({})", error, details)),
        Ok(ErrorBody { error, .. }) => Some(error),
        Err(_) => Some(body.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_error() {
        assert_eq!(
            error_message(r#"{"error":"OCR failed"}"#).as_deref(),
            Some("OCR failed")
        );
        assert_eq!(
            error_message(r#"{"error":"OCR failed","details":"timeout"}"#).as_deref(),
            Some("OCR failed (timeout)")
        );
        assert_eq!(error_message("Bad Gateway\n").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("  "), None);
    }
}
