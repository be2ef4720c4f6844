//! Text extraction from uploaded files.
//!
//! The reader turns raw upload bytes into [`RawDocument`]s. The content type is
//! inferred from the filename extension; files without a recognised extension
//! are accepted when their bytes are valid UTF-8.
//!
//! | Format | Extraction |
//! |--------|------------|
//! | txt, md, csv, json, xml, yaml, ... | UTF-8 (lossy) |
//! | html | visible text via `scraper` |
//! | pdf | `pdf-extract` |
//! | docx, pptx, xlsx | ZIP container + `quick-xml` |
//!
//! Legacy binary Office formats (doc, xls, ppt) are rejected with a parse error.

use crate::types::{AppError, RawDocument, Result};
use quick_xml::events::Event;
use std::io::{Cursor, Read};

const MIME_PDF: &str = "application/pdf";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MIME_HTML: &str = "text/html";

/// Listed in rejection messages.
const SUPPORTED_FORMATS: &str = "txt, md, csv, json, html, pdf, docx, pptx, xlsx";

/// Upper bound on the decompressed size of a single XML part inside an Office file.
const MAX_XML_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Turns an uploaded file into raw text documents.
pub trait DocumentReader: Send + Sync {
    /// Extract the text of `bytes`.
    ///
    /// Returns no documents when the file holds no text at all.
    fn read(&self, bytes: &[u8], filename: &str) -> Result<Vec<RawDocument>>;
}

/// Format-aware reader backed by extraction libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractingReader;

impl ExtractingReader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for ExtractingReader {
    fn read(&self, bytes: &[u8], filename: &str) -> Result<Vec<RawDocument>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let text = match DocumentKind::detect(filename) {
            DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
            DocumentKind::Html => extract_html(bytes),
            DocumentKind::Pdf => extract_pdf(bytes)?,
            DocumentKind::Docx => extract_docx(bytes)?,
            DocumentKind::Pptx => extract_pptx(bytes)?,
            DocumentKind::Xlsx => extract_xlsx(bytes)?,
            DocumentKind::Unknown => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    return Err(AppError::Parse(format!(
                        "unsupported document type for '{}' (supported: {})",
                        filename, SUPPORTED_FORMATS
                    )))
                }
            },
            DocumentKind::Unsupported(mime) => {
                return Err(AppError::Parse(format!(
                    "unsupported document type '{}' for '{}' (supported: {})",
                    mime, filename, SUPPORTED_FORMATS
                )))
            }
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![RawDocument::new(text)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Html,
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    /// No extension, or one `mime_guess` does not know
    Unknown,
    Unsupported(&'static str),
}

impl DocumentKind {
    fn detect(filename: &str) -> Self {
        let Some(mime) = mime_guess::from_path(filename).first_raw() else {
            return DocumentKind::Unknown;
        };

        match mime {
            MIME_PDF => DocumentKind::Pdf,
            MIME_DOCX => DocumentKind::Docx,
            MIME_PPTX => DocumentKind::Pptx,
            MIME_XLSX => DocumentKind::Xlsx,
            MIME_HTML => DocumentKind::Html,
            m if m.starts_with("text/") => DocumentKind::Text,
            "application/json"
            | "application/xml"
            | "application/x-yaml"
            | "application/toml"
            | "application/javascript"
            | "application/x-sh" => DocumentKind::Text,
            other => DocumentKind::Unsupported(other),
        }
    }
}

fn extract_html(bytes: &[u8]) -> String {
    let html = String::from_utf8_lossy(bytes);
    let document = scraper::Html::parse_document(&html);

    document
        .root_element()
        .descendants()
        .filter(|node| !node.ancestors().any(|a| is_non_content(a.value())))
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Elements whose text is code or metadata rather than page content.
fn is_non_content(node: &scraper::Node) -> bool {
    node.as_element().is_some_and(|element| {
        matches!(
            element.name(),
            "script" | "style" | "noscript" | "template"
        )
    })
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| AppError::Parse("PDF extraction failed: malformed document".to_string()))?
        .map_err(|e| AppError::Parse(format!("PDF extraction failed: {}", e)))
}

// ============================================================================
// Office Open XML
// ============================================================================

type OfficeArchive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<OfficeArchive<'_>> {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Parse(format!("invalid Office document: {}", e)))
}

fn read_part(archive: &mut OfficeArchive<'_>, name: &str) -> Result<Vec<u8>> {
    let part = archive
        .by_name(name)
        .map_err(|e| AppError::Parse(format!("missing part '{}': {}", name, e)))?;

    let mut out = Vec::new();
    part.take(MAX_XML_PART_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| AppError::Parse(format!("failed to read '{}': {}", name, e)))?;

    if out.len() as u64 >= MAX_XML_PART_BYTES {
        return Err(AppError::Parse(format!("part '{}' exceeds size limit", name)));
    }
    Ok(out)
}

/// Part names under `prefix` ending in `.xml`, ordered by their numeric suffix
/// (`slide2.xml` before `slide10.xml`).
fn numbered_parts(archive: &OfficeArchive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();

    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn xml_error(e: quick_xml::Error) -> AppError {
    AppError::Parse(format!("malformed XML: {}", e))
}

/// Collect the text of every `<t>` run, one line per `<p>` paragraph.
///
/// WordprocessingML (`w:t`, `w:p`) and DrawingML (`a:t`, `a:p`) share this shape.
fn paragraph_text(xml: &[u8]) -> Result<String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_run = true,
            Event::Text(te) if in_run => {
                out.push_str(&te.unescape().map_err(xml_error)?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_part(&mut archive, "word/document.xml")?;
    paragraph_text(&xml)
}

fn extract_pptx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;
    let slides = numbered_parts(&archive, "ppt/slides/slide");

    let mut out = String::new();
    for name in slides {
        let xml = read_part(&mut archive, &name)?;
        out.push_str(&paragraph_text(&xml)?);
        out.push('\n');
    }
    Ok(out)
}

fn extract_xlsx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;

    // Workbooks without any string cells omit the shared string table
    let shared_strings = if archive.index_for_name("xl/sharedStrings.xml").is_some() {
        let xml = read_part(&mut archive, "xl/sharedStrings.xml")?;
        shared_string_table(&xml)?
    } else {
        Vec::new()
    };

    let mut out = String::new();
    for name in numbered_parts(&archive, "xl/worksheets/sheet") {
        let xml = read_part(&mut archive, &name)?;
        out.push_str(&sheet_text(&xml, &shared_strings)?);
    }
    Ok(out)
}

/// One entry per `<si>`, concatenating all of its rich-text runs.
fn shared_string_table(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_run = true,
                _ => {}
            },
            Event::Text(te) if in_run => current.push_str(&te.unescape().map_err(xml_error)?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Cell values tab-separated, one line per row.
fn sheet_text(xml: &[u8], shared_strings: &[String]) -> Result<String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut shared_cell = false;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => {
                    shared_cell = e.attributes().flatten().any(|a| {
                        a.key.local_name().as_ref() == b"t" && a.value.as_ref() == b"s"
                    });
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Text(te) if in_value => {
                let raw = te.unescape().map_err(xml_error)?;
                let value = raw.trim();
                if shared_cell {
                    if let Some(s) = value
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i))
                    {
                        row.push(s.clone());
                    }
                } else if !value.is_empty() {
                    row.push(value.to_string());
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => shared_cell = false,
                b"row" => {
                    if !row.is_empty() {
                        out.push_str(&row.join("\t"));
                        out.push('\n');
                        row.clear();
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
