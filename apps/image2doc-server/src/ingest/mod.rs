//! Upload → `.docx` pipeline behind `POST /ocr`

mod pipeline;
mod types;

pub use pipeline::IngestPipeline;
pub use types::{IngestError, IngestOutcome, IngestRequest, IngestStage};
