//! Text extraction from exam-paper and study-text documents.
//!
//! Supported formats are PDF (via `lopdf`), DOCX (the `word/document.xml`
//! part inside the ZIP container), and plain text. Every path returns
//! the same shape: a single `String` of extracted text, normalized to
//! NFC with PDF ligatures expanded, replacement characters dropped, and
//! Unix newlines.

use std::fs;
use std::path::Path;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub mod docx;
pub mod pdf;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf error: {0}")]
    Pdf(String),
    #[error("pdf is encrypted")]
    Encrypted,
    #[error("docx error: {0}")]
    Docx(String),
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Document formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" | "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Extract the text of one document, dispatching on its extension.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?;
    let raw = match kind {
        DocumentKind::Pdf => pdf::extract(&fs::read(path)?)?,
        DocumentKind::Docx => docx::extract(fs::File::open(path)?)?,
        DocumentKind::Text => fs::read_to_string(path)?,
    };
    Ok(cleanup(&raw))
}

/// Shared post-extraction cleanup: NFC normalization, ligature
/// expansion, replacement-character removal, newline unification.
pub fn cleanup(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    normalized
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace('\u{FFFD}', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}
