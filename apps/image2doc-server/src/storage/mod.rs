//! Storage module for the local filesystem
//!
//! Staged uploads, generated documents and request-scoped temp files.

mod local;
mod temp;
mod types;

pub use local::LocalStorage;
pub use temp::TempFiles;
pub use types::*;
