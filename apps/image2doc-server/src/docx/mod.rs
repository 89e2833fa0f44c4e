//! Word document generation
//!
//! Maps recognized text onto paragraphs and runs, then packages them as
//! an Office Open XML (`.docx`) file.

mod assembler;
mod types;
mod writer;

pub use assembler::{is_uppercase_line, DocumentAssembler};
pub use types::{Alignment, DocxDocument, DocxError, Paragraph, Run, StyleRules};
pub use writer::{DocxWriter, DOCX_MIME_TYPE};
