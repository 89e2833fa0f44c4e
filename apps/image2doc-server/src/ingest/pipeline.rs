//! Ingest pipeline
//!
//! normalizing → recognizing → assembling, with every intermediate file
//! registered in a request-scoped [`TempFiles`] so nothing outlives the
//! request, even when the handler future is dropped mid-flight.

use tracing::Instrument;
use uuid::Uuid;

use super::types::{IngestError, IngestOutcome, IngestRequest, IngestStage};
use crate::docx::{DocumentAssembler, DocxWriter};
use crate::normalize::ImageNormalizer;
use crate::ocr::OcrService;
use crate::storage::{LocalStorage, TempFiles};

#[derive(Clone)]
pub struct IngestPipeline {
    storage: LocalStorage,
    normalizer: ImageNormalizer,
    ocr: OcrService,
    assembler: DocumentAssembler,
    writer: DocxWriter,
}

impl IngestPipeline {
    pub fn new(
        storage: LocalStorage,
        normalizer: ImageNormalizer,
        ocr: OcrService,
        assembler: DocumentAssembler,
    ) -> Self {
        Self {
            storage,
            normalizer,
            ocr,
            assembler,
            writer: DocxWriter::default(),
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    /// Run one upload through the pipeline
    pub async fn run(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        if request.data.is_empty() {
            return Err(IngestError::NoFile);
        }

        let span = tracing::info_span!("ingest", request_id = %Uuid::new_v4());
        async {
            let temps = TempFiles::new();
            let result = self.process(&request, &temps).await;

            let removed = temps.cleanup();
            tracing::debug!(stage = %IngestStage::Cleanup, removed, "Temporary files removed");

            result
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        request: &IngestRequest,
        temps: &TempFiles,
    ) -> Result<IngestOutcome, IngestError> {
        tracing::info!(
            stage = %IngestStage::Normalizing,
            bytes = request.data.len(),
            extension = %request.extension,
            "Image received"
        );
        let staged = self
            .storage
            .stage_upload(&request.data, &request.extension, temps)
            .await?;

        let normalized = self
            .normalizer
            .normalize(&staged.path, &staged.extension, temps)
            .await?;

        tracing::info!(
            stage = %IngestStage::Recognizing,
            bytes = normalized.size,
            converted = normalized.converted,
            resized = normalized.resized,
            provider = self.ocr.provider_type().as_str(),
            "Running OCR"
        );
        let image = tokio::fs::read(&normalized.path).await?;
        let recognized = self.ocr.recognize(&image).await?;

        let mut document = self.assembler.assemble(&recognized);
        if let Some(ref title) = request.title {
            document = document.with_title(title.clone());
        }
        let paragraphs = document.paragraphs.len();
        tracing::info!(
            stage = %IngestStage::Assembling,
            paragraphs,
            chars = recognized.text.chars().count(),
            "Assembling document"
        );

        let bytes = self.writer.write(&document)?;
        let stored = self.storage.save_document(bytes).await?;

        tracing::info!(
            stage = %IngestStage::Responding,
            file = %stored.file_name,
            bytes = stored.size,
            "Document ready"
        );

        Ok(IngestOutcome {
            text: recognized.text,
            document: stored,
            provider: recognized.provider,
            paragraphs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::normalize::{encode_jpeg, NormalizeConfig};
    use crate::ocr::{MockProvider, OcrServiceConfig};
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn pipeline(dir: &TempDir, provider: MockProvider) -> IngestPipeline {
        let storage = LocalStorage::new(
            &StorageConfig {
                upload_dir: dir.path().join("uploads"),
                output_dir: dir.path().join("generated"),
            },
            "http://localhost:3000",
        );
        storage.init().await.unwrap();

        IngestPipeline::new(
            storage,
            ImageNormalizer::new(NormalizeConfig::default()),
            OcrService::with_provider(Arc::new(provider), OcrServiceConfig::default()),
            DocumentAssembler::default(),
        )
    }

    fn jpeg() -> Vec<u8> {
        encode_jpeg(&DynamicImage::ImageRgb8(RgbImage::new(32, 32)), 95).unwrap()
    }

    fn upload_dir_is_empty(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path().join("uploads")).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_successful_run_writes_document_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, MockProvider::returning("TITLE\n\nbody text")).await;

        let outcome = pipeline
            .run(IngestRequest {
                data: jpeg(),
                extension: "jpg".to_string(),
                title: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.text, "TITLE\n\nbody text");
        assert_eq!(outcome.paragraphs, 2);
        let bytes = std::fs::read(&outcome.document.path).unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_empty_upload_is_no_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, MockProvider::returning("x")).await;

        let err = pipeline
            .run(IngestRequest {
                data: Vec::new(),
                extension: "jpg".to_string(),
                title: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoFile));
        assert_eq!(err.stage(), IngestStage::AwaitingFile);
    }

    #[tokio::test]
    async fn test_failures_still_clean_up() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, MockProvider::failing("engine crashed")).await;

        let err = pipeline
            .run(IngestRequest {
                data: jpeg(),
                extension: "jpg".to_string(),
                title: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Ocr(_)));
        assert!(upload_dir_is_empty(&dir));

        let err = pipeline
            .run(IngestRequest {
                data: b"garbage".to_vec(),
                extension: "png".to_string(),
                title: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Normalize(_)));
        assert!(upload_dir_is_empty(&dir));
    }
}
