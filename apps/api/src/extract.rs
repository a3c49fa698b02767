//! Resume document text extraction. Dispatches on file extension (with a
//! MIME-type fallback) to one of three extractors: PDF, DOCX, or plain text.

use std::io::{Cursor, Read};

use thiserror::Error;
use tracing::debug;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format '{0}'. Please upload PDF, DOCX, or TXT.")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("File is not valid UTF-8 text")]
    InvalidText,

    #[error("No extractable text found in document")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Resolves the extractor from the declared content type, falling back to
    /// the filename extension.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self, ExtractError> {
        match content_type {
            Some("application/pdf") => return Ok(DocumentKind::Pdf),
            Some(ct) if ct == DOCX_MIME => return Ok(DocumentKind::Docx),
            Some("text/plain") => return Ok(DocumentKind::Text),
            _ => {}
        }

        let name = filename.to_lowercase();
        if name.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if name.ends_with(".docx") {
            Ok(DocumentKind::Docx)
        } else if name.ends_with(".txt") {
            Ok(DocumentKind::Text)
        } else {
            let ext = name.rsplit('.').next().unwrap_or("").to_string();
            Err(ExtractError::UnsupportedFormat(ext))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Text => "text",
        }
    }
}

/// Extracts plain text from an uploaded document.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        DocumentKind::Docx => extract_docx(bytes)?,
        DocumentKind::Text => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidText)?
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    debug!(
        "Extracted {} characters from {} document",
        text.chars().count(),
        kind.as_str()
    );
    Ok(text)
}

/// A DOCX file is a ZIP container; the document body lives in
/// `word/document.xml` as WordprocessingML.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(format!("missing word/document.xml: {e}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    Ok(document_xml_to_text(&xml))
}

/// Collects the text runs (`<w:t>`) out of WordprocessingML. Paragraph ends
/// and explicit breaks become newlines, tab marks become tabs.
fn document_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('>') else { break };
        let tag = &tail[..close];
        let after = &tail[close + 1..];

        let name = tag.trim_end_matches('/').split_whitespace().next().unwrap_or("");
        match name {
            "w:t" if !tag.ends_with('/') => {
                if let Some(end) = after.find("</w:t>") {
                    out.push_str(&decode_xml_entities(&after[..end]));
                    rest = &after[end..];
                    continue;
                }
            }
            "/w:p" | "w:br" => out.push('\n'),
            "w:tab" => out.push('\t'),
            _ => {}
        }
        rest = after;
    }

    out
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
