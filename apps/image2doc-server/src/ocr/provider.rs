//! OCR Providers
//!
//! Defines the provider trait and implementations for different OCR backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{
    LayoutBlock, LayoutPage, LayoutParagraph, LayoutSymbol, LayoutWord, OcrError, OcrProvider,
    OcrResult, TextLayout, TextStyle,
};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Perform OCR on an image
    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError>;
}

/// Tesseract OCR provider
///
/// Shells out to the `tesseract` binary and reads the recognized text from
/// stdout. Only flat text is produced.
pub struct TesseractProvider {
    binary: String,
    /// Where the engine's input copy is written
    work_dir: PathBuf,
}

impl TesseractProvider {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            work_dir: std::env::temp_dir(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl AsRef<Path>) -> Self {
        self.work_dir = work_dir.as_ref().to_path_buf();
        self
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        // Removed on drop, so a timed-out or cancelled call leaves nothing behind
        let input = tempfile::Builder::new()
            .prefix("ocr_input_")
            .suffix(".jpg")
            .tempfile_in(&self.work_dir)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to create temp file: {}", e)))?;

        tokio::fs::write(input.path(), image_data)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let output = tokio::process::Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .kill_on_drop(true)
            .output()
            .await;

        if let Err(e) = input.close() {
            tracing::warn!("Failed to remove OCR input copy: {}", e);
        }

        let output = output
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(OcrResult::plain(text, OcrProvider::Tesseract))
    }
}

/// Cloud document text detection provider
///
/// Speaks the `images:annotate` REST shape with a `DOCUMENT_TEXT_DETECTION`
/// feature and maps the returned annotation tree into [`TextLayout`].
pub struct CloudVisionProvider {
    /// API base URL, e.g. "https://vision.googleapis.com"
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl CloudVisionProvider {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint)
    }
}

/// Turn a Tesseract language string ("eng+ell") into BCP-47 hints ("en", "el")
pub fn language_hints(language: &str) -> Vec<String> {
    language
        .split('+')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| match code {
            "eng" => "en".to_string(),
            "ell" | "grc" => "el".to_string(),
            "deu" => "de".to_string(),
            "fra" => "fr".to_string(),
            "spa" => "es".to_string(),
            "ita" => "it".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[async_trait]
impl OcrProviderTrait for CloudVisionProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::CloudVision
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        use base64::Engine;

        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = serde_json::json!({
            "requests": [{
                "image": { "content": image_base64 },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
                "imageContext": { "languageHints": language_hints(language) }
            }]
        });

        let response = self
            .client
            .post(self.annotate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call annotate API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "annotate API returned {}: {}",
                status, body
            )));
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        parse_annotate_response(body)
    }
}

// ============================================================================
// Annotate API wire types
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<WirePage>,
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default)]
    blocks: Vec<WireBlock>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireBlock {
    #[serde(default)]
    paragraphs: Vec<WireParagraph>,
}

#[derive(Debug, Deserialize)]
struct WireParagraph {
    #[serde(default)]
    words: Vec<WireWord>,
}

#[derive(Debug, Deserialize)]
struct WireWord {
    #[serde(default)]
    symbols: Vec<WireSymbol>,
}

#[derive(Debug, Deserialize)]
struct WireSymbol {
    #[serde(default)]
    text: String,
    #[serde(default)]
    property: Option<WireProperty>,
}

/// Per-symbol properties. The API reports no font style, only breaks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProperty {
    #[serde(default)]
    detected_break: Option<WireBreak>,
}

#[derive(Debug, Deserialize)]
struct WireBreak {
    #[serde(rename = "type", default)]
    kind: String,
}

impl WireSymbol {
    /// Symbol text as printed; a hyphen break is not part of `text`
    fn into_layout(self) -> LayoutSymbol {
        let hyphenated = self
            .property
            .and_then(|p| p.detected_break)
            .is_some_and(|b| b.kind == "HYPHEN");
        let mut text = self.text;
        if hyphenated {
            text.push('-');
        }
        LayoutSymbol { text }
    }
}

pub(crate) fn parse_annotate_response(body: AnnotateResponse) -> Result<OcrResult, OcrError> {
    let first = body
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::ApiError("empty annotate response".to_string()))?;

    if let Some(status) = first.error {
        return Err(OcrError::ApiError(status.message));
    }

    // No annotation means no text was found, which is not an error
    let Some(annotation) = first.full_text_annotation else {
        return Ok(OcrResult {
            text: String::new(),
            confidence: None,
            provider: OcrProvider::CloudVision,
            layout: Some(TextLayout::default()),
        });
    };

    let confidence = annotation
        .pages
        .first()
        .and_then(|p| p.confidence)
        .map(|c| c * 100.0);

    let layout = TextLayout {
        pages: annotation
            .pages
            .into_iter()
            .map(|page| LayoutPage {
                blocks: page
                    .blocks
                    .into_iter()
                    .map(|block| LayoutBlock {
                        paragraphs: block
                            .paragraphs
                            .into_iter()
                            .map(|para| LayoutParagraph {
                                words: para
                                    .words
                                    .into_iter()
                                    .map(|word| LayoutWord {
                                        symbols: word
                                            .symbols
                                            .into_iter()
                                            .map(WireSymbol::into_layout)
                                            .collect(),
                                        style: TextStyle::default(),
                                    })
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    };

    Ok(OcrResult {
        text: annotation.text,
        confidence,
        provider: OcrProvider::CloudVision,
        layout: Some(layout),
    })
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: Result<OcrResult, String>,
    pub available: bool,
}

#[cfg(test)]
impl MockProvider {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(OcrResult::plain(text, OcrProvider::Tesseract)),
            available: true,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            available: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, _image_data: &[u8], _language: &str) -> Result<OcrResult, OcrError> {
        self.response.clone().map_err(OcrError::ProcessingError)
    }
}
