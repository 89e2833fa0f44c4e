//! Document intake flow
//!
//! prepare → upload → record: turns an image on disk into an entry in the
//! document store.

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageReader};

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::store::DocumentStore;
use crate::types::{DocumentItem, OcrResponse};

/// Quality used for the client-side JPEG conversion
pub const JPEG_QUALITY: u8 = 95;

/// Decode any supported image and re-encode it as JPEG
pub fn prepare_image(path: &Path) -> Result<Vec<u8>> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let image = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut buffer = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))?;

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        bytes = buffer.len(),
        "Image prepared"
    );
    Ok(buffer)
}

/// What one intake run produced
#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub item: DocumentItem,
    pub response: OcrResponse,
}

pub struct IntakeFlow<'a> {
    api: &'a ApiClient,
    store: &'a DocumentStore,
}

impl<'a> IntakeFlow<'a> {
    pub fn new(api: &'a ApiClient, store: &'a DocumentStore) -> Self {
        Self { api, store }
    }

    pub async fn run(&self, path: &Path, name: Option<&str>) -> Result<IntakeOutcome> {
        let source: PathBuf = path.to_path_buf();
        let jpeg = tokio::task::spawn_blocking(move || prepare_image(&source))
            .await
            .map_err(|e| ClientError::Io(std::io::Error::other(e)))??;

        let response = self
            .api
            .upload_image(jpeg, &upload_file_name(path), self.store.user_id(), name)
            .await?;

        let item = document_item(&response, name);
        self.store.add_local(item.clone()).await;

        tracing::info!(id = %item.id, name = %item.name, "Document created");
        Ok(IntakeOutcome { item, response })
    }
}

/// `<stem>.jpg`, since the bytes are always JPEG after preparation
fn upload_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    format!("{}.jpg", stem)
}

fn document_item(response: &OcrResponse, name: Option<&str>) -> DocumentItem {
    let now = Utc::now();
    DocumentItem {
        id: response
            .document_id
            .clone()
            .unwrap_or_else(|| now.timestamp_millis().to_string()),
        name: name
            .map(str::to_string)
            .unwrap_or_else(|| format!("document {}", now.format("%Y-%m-%d"))),
        url: response.docx_url.clone(),
        uploaded_at: now.to_rfc3339(),
        text: response.text.clone(),
    }
}
