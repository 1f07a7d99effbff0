//! Turns raw document bytes into plain text for ingestion.

use std::fs;
use std::path::Path;

use super::error::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Detects the kind from the file extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" | "markdown" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Extracts plain text from an in-memory document named `name`.
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_name(name)
        .ok_or_else(|| ExtractionError::UnsupportedFormat(name.to_string()))?;

    let text = match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf {
                name: name.to_string(),
                reason: e.to_string(),
            })?
        }
        DocumentKind::PlainText => {
            String::from_utf8(bytes.to_vec()).map_err(|source| ExtractionError::InvalidText {
                name: name.to_string(),
                source,
            })?
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty(name.to_string()));
    }
    Ok(text)
}

/// Reads and extracts a document from disk.
pub fn extract_file(path: &Path) -> Result<String, ExtractionError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    extract_text(&name, &bytes)
}
