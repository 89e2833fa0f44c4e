//! Document model for generated Word files

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ocr::TextStyle;

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of `w:jc/@w:val`
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
        }
    }
}

/// A run of identically formatted text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Font size in points
    pub font_size: Option<f32>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, style: &TextStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            font_size: style.font_size,
        }
    }

    pub fn has_formatting(&self) -> bool {
        self.bold || self.italic || self.underline || self.font_size.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            alignment: Alignment::Left,
        }
    }

    /// Concatenated text of every run
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// In-memory Word document
#[derive(Debug, Clone)]
pub struct DocxDocument {
    pub paragraphs: Vec<Paragraph>,
    pub title: Option<String>,
    pub created: DateTime<Utc>,
}

impl DocxDocument {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            title: None,
            created: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Style mapping rules applied when assembling flat text
#[derive(Debug, Clone, Deserialize)]
pub struct StyleRules {
    /// Render lines made only of uppercase letters and whitespace in bold
    pub bold_uppercase_lines: bool,
}

impl Default for StyleRules {
    fn default() -> Self {
        Self {
            bold_uppercase_lines: true,
        }
    }
}

/// Document serialization errors
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
