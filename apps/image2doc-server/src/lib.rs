//! Image2Doc Server Library
//!
//! Turns a photographed or scanned page into an editable Word document:
//! image normalization, OCR, paragraph assembly and `.docx` packaging,
//! served over HTTP. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `normalize`: Re-encode uploads to a JPEG the OCR engine accepts
//! - `ocr`: Pluggable text recognition providers
//! - `docx`: Paragraph assembly and Office Open XML writing
//! - `ingest`: The upload pipeline behind `POST /ocr`
//! - `routes`: HTTP surface

pub mod config;
pub mod db;
pub mod docx;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod ocr;
pub mod routes;
pub mod state;
pub mod storage;

pub use routes::build_router;
pub use state::AppState;
