//! WordprocessingML package writer
//!
//! Produces a minimal Office Open XML package that Word, LibreOffice and
//! Pages open without repair prompts.

use std::io::{Cursor, Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::types::{DocxDocument, DocxError, Paragraph, Run};

pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Body font size in half-points
const DEFAULT_FONT_HALF_POINTS: u32 = 22;

type XmlWriter<'a> = Writer<&'a mut ZipWriter<Cursor<Vec<u8>>>>;

/// Serializes a [`DocxDocument`] to `.docx` bytes
#[derive(Debug, Clone)]
pub struct DocxWriter {
    creator: String,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self {
            creator: "Image2Doc".to_string(),
        }
    }
}

impl DocxWriter {
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
        }
    }

    pub fn write(&self, document: &DocxDocument) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        write_content_types(&mut Writer::new(&mut zip))?;

        zip.start_file("_rels/.rels", options)?;
        write_package_rels(&mut Writer::new(&mut zip))?;

        zip.start_file("docProps/core.xml", options)?;
        self.write_core_properties(&mut Writer::new(&mut zip), document)?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        write_document_rels(&mut Writer::new(&mut zip))?;

        zip.start_file("word/styles.xml", options)?;
        write_styles(&mut Writer::new(&mut zip))?;

        zip.start_file("word/document.xml", options)?;
        write_document(&mut Writer::new(&mut zip), document)?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn write_core_properties(
        &self,
        writer: &mut XmlWriter<'_>,
        document: &DocxDocument,
    ) -> Result<(), DocxError> {
        write_decl(writer)?;

        let mut root = BytesStart::new("cp:coreProperties");
        root.push_attribute((
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ));
        root.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
        root.push_attribute(("xmlns:dcterms", "http://purl.org/dc/terms/"));
        root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        writer.write_event(Event::Start(root))?;

        if let Some(ref title) = document.title {
            write_simple_element(writer, "dc:title", &sanitize(title))?;
        }
        write_simple_element(writer, "dc:creator", &self.creator)?;

        let created = document.created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        for name in ["dcterms:created", "dcterms:modified"] {
            let mut elem = BytesStart::new(name);
            elem.push_attribute(("xsi:type", "dcterms:W3CDTF"));
            writer.write_event(Event::Start(elem))?;
            writer.write_event(Event::Text(BytesText::new(&created)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }

        writer.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
        Ok(())
    }
}

fn write_decl<W: Write>(writer: &mut Writer<W>) -> Result<(), DocxError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

fn write_simple_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `<name w:val="value"/>`
fn write_val_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), DocxError> {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("w:val", value));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_content_types<W: Write>(writer: &mut Writer<W>) -> Result<(), DocxError> {
    write_decl(writer)?;

    let mut root = BytesStart::new("Types");
    root.push_attribute(("xmlns", NS_CONTENT_TYPES));
    writer.write_event(Event::Start(root))?;

    for (extension, content_type) in [
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("xml", "application/xml"),
    ] {
        let mut elem = BytesStart::new("Default");
        elem.push_attribute(("Extension", extension));
        elem.push_attribute(("ContentType", content_type));
        writer.write_event(Event::Empty(elem))?;
    }

    for (part, content_type) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
    ] {
        let mut elem = BytesStart::new("Override");
        elem.push_attribute(("PartName", part));
        elem.push_attribute(("ContentType", content_type));
        writer.write_event(Event::Empty(elem))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(())
}

fn write_relationships<W: Write>(
    writer: &mut Writer<W>,
    relationships: &[(&str, &str, &str)],
) -> Result<(), DocxError> {
    write_decl(writer)?;

    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PKG_REL));
    writer.write_event(Event::Start(root))?;

    for (id, kind, target) in relationships {
        let mut elem = BytesStart::new("Relationship");
        elem.push_attribute(("Id", *id));
        elem.push_attribute(("Type", *kind));
        elem.push_attribute(("Target", *target));
        writer.write_event(Event::Empty(elem))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(())
}

fn write_package_rels<W: Write>(writer: &mut Writer<W>) -> Result<(), DocxError> {
    write_relationships(
        writer,
        &[
            ("rId1", REL_OFFICE_DOCUMENT, "word/document.xml"),
            ("rId2", REL_CORE_PROPERTIES, "docProps/core.xml"),
        ],
    )
}

fn write_document_rels<W: Write>(writer: &mut Writer<W>) -> Result<(), DocxError> {
    write_relationships(writer, &[("rId1", REL_STYLES, "styles.xml")])
}

fn write_styles<W: Write>(writer: &mut Writer<W>) -> Result<(), DocxError> {
    write_decl(writer)?;

    let mut root = BytesStart::new("w:styles");
    root.push_attribute(("xmlns:w", NS_MAIN));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("w:docDefaults")))?;

    writer.write_event(Event::Start(BytesStart::new("w:rPrDefault")))?;
    writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
    let mut fonts = BytesStart::new("w:rFonts");
    for attr in ["w:ascii", "w:hAnsi", "w:cs", "w:eastAsia"] {
        fonts.push_attribute((attr, "Calibri"));
    }
    writer.write_event(Event::Empty(fonts))?;
    let half_points = DEFAULT_FONT_HALF_POINTS.to_string();
    write_val_element(writer, "w:sz", &half_points)?;
    write_val_element(writer, "w:szCs", &half_points)?;
    writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    writer.write_event(Event::End(BytesEnd::new("w:rPrDefault")))?;

    writer.write_event(Event::Start(BytesStart::new("w:pPrDefault")))?;
    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    let mut spacing = BytesStart::new("w:spacing");
    spacing.push_attribute(("w:after", "160"));
    spacing.push_attribute(("w:line", "259"));
    spacing.push_attribute(("w:lineRule", "auto"));
    writer.write_event(Event::Empty(spacing))?;
    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    writer.write_event(Event::End(BytesEnd::new("w:pPrDefault")))?;

    writer.write_event(Event::End(BytesEnd::new("w:docDefaults")))?;

    let mut normal = BytesStart::new("w:style");
    normal.push_attribute(("w:type", "paragraph"));
    normal.push_attribute(("w:default", "1"));
    normal.push_attribute(("w:styleId", "Normal"));
    writer.write_event(Event::Start(normal))?;
    write_val_element(writer, "w:name", "Normal")?;
    writer.write_event(Event::End(BytesEnd::new("w:style")))?;

    writer.write_event(Event::End(BytesEnd::new("w:styles")))?;
    Ok(())
}

fn write_document<W: Write>(
    writer: &mut Writer<W>,
    document: &DocxDocument,
) -> Result<(), DocxError> {
    write_decl(writer)?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", NS_MAIN));
    root.push_attribute(("xmlns:r", NS_REL));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for paragraph in &document.paragraphs {
        write_paragraph(writer, paragraph)?;
    }

    // A4 with one-inch margins
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    let mut size = BytesStart::new("w:pgSz");
    size.push_attribute(("w:w", "11906"));
    size.push_attribute(("w:h", "16838"));
    writer.write_event(Event::Empty(size))?;
    let mut margins = BytesStart::new("w:pgMar");
    for (attr, value) in [
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "708"),
        ("w:footer", "708"),
        ("w:gutter", "0"),
    ] {
        margins.push_attribute((attr, value));
    }
    writer.write_event(Event::Empty(margins))?;
    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(())
}

fn write_paragraph<W: Write>(writer: &mut Writer<W>, paragraph: &Paragraph) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    write_val_element(writer, "w:jc", paragraph.alignment.as_ooxml())?;
    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;

    for run in &paragraph.runs {
        write_run(writer, run)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_run<W: Write>(writer: &mut Writer<W>, run: &Run) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;

    if run.has_formatting() {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        if run.bold {
            writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
        }
        if run.italic {
            writer.write_event(Event::Empty(BytesStart::new("w:i")))?;
        }
        if run.underline {
            write_val_element(writer, "w:u", "single")?;
        }
        if let Some(points) = run.font_size {
            let half_points = half_points(points).to_string();
            write_val_element(writer, "w:sz", &half_points)?;
            write_val_element(writer, "w:szCs", &half_points)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    let mut text = BytesStart::new("w:t");
    text.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(text))?;
    writer.write_event(Event::Text(BytesText::new(&sanitize(&run.text))))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn half_points(points: f32) -> u32 {
    (points * 2.0).round().clamp(2.0, 3276.0) as u32
}

/// Drop characters XML 1.0 cannot carry (form feeds from page breaks and
/// the like); tabs become spaces
fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}
