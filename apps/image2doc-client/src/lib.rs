//! Image2Doc Client Library
//!
//! Uploads page photos to an Image2Doc server and keeps the user's list of
//! generated Word documents. The CLI binary is in main.rs.

pub mod api;
pub mod config;
pub mod error;
pub mod intake;
pub mod store;
pub mod types;

pub use api::{ApiClient, DocumentsApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use intake::IntakeFlow;
pub use store::DocumentStore;
pub use types::{DocumentItem, OcrResponse};
