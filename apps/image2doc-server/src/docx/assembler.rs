//! OCR output → paragraph structure
//!
//! Deterministic and single pass: paragraph order always equals input
//! reading order. No column or table reconstruction is attempted.

use super::types::{Alignment, DocxDocument, Paragraph, Run, StyleRules};
use crate::ocr::{LayoutParagraph, OcrResult, TextLayout};

#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    rules: StyleRules,
}

impl DocumentAssembler {
    pub fn new(rules: StyleRules) -> Self {
        Self { rules }
    }

    /// Pick the structured layout when the engine produced one with at
    /// least one paragraph, else fall back to the flat text
    pub fn assemble(&self, result: &OcrResult) -> DocxDocument {
        match &result.layout {
            Some(layout) if layout.paragraph_count() > 0 => self.from_layout(layout),
            _ => self.from_text(&result.text),
        }
    }

    /// One paragraph per non-blank line
    pub fn from_text(&self, text: &str) -> DocxDocument {
        let paragraphs = text
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let run = if self.rules.bold_uppercase_lines && is_uppercase_line(line) {
                    Run::bold(line)
                } else {
                    Run::plain(line)
                };
                Paragraph::new(vec![run])
            })
            .collect();

        DocxDocument::new(paragraphs)
    }

    /// One left-aligned paragraph per layout paragraph
    pub fn from_layout(&self, layout: &TextLayout) -> DocxDocument {
        DocxDocument::new(layout.paragraphs().map(layout_paragraph).collect())
    }
}

fn layout_paragraph(paragraph: &LayoutParagraph) -> Paragraph {
    let mut runs = Vec::with_capacity(paragraph.words.len() * 2);

    for word in &paragraph.words {
        let text = word.text();
        if text.is_empty() {
            continue;
        }
        if !runs.is_empty() {
            runs.push(Run::plain(" "));
        }
        runs.push(Run::styled(text, &word.style));
    }

    Paragraph {
        runs,
        alignment: Alignment::Left,
    }
}

/// Entirely uppercase letters and whitespace, with at least one letter
pub fn is_uppercase_line(line: &str) -> bool {
    line.chars().any(char::is_alphabetic)
        && line.chars().all(|c| c.is_whitespace() || c.is_uppercase())
}
