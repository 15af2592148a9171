//! Source file handling - document text extraction and image discovery

mod images;

pub use images::{is_image, list_images, IMAGE_EXTENSIONS};

use anyhow::{Context, Result};
use std::path::Path;

/// Document extensions the agent can index (lowercase, no dot)
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Is this path a document type we can extract text from?
pub fn is_supported_document(path: &Path) -> bool {
    has_extension(path, DOCUMENT_EXTENSIONS)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

/// Pulls the full text out of a document
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// PDF text extraction via `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        // pdf-extract panics on some malformed files instead of returning Err
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| anyhow::anyhow!("PDF parser crashed on {}", path.display()))?
            .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;
        tracing::debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(text)
    }
}

/// Leading `max_chars` characters of `text`, never splitting a character
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supported_documents() {
        assert!(is_supported_document(&PathBuf::from("paper.pdf")));
        assert!(is_supported_document(&PathBuf::from("dir/PAPER.PDF")));
        assert!(!is_supported_document(&PathBuf::from("paper.docx")));
        assert!(!is_supported_document(&PathBuf::from("pdf")));
        assert!(!is_supported_document(&PathBuf::from("archive.pdf.gz")));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("hello", 10), "hello");
        assert_eq!(excerpt("hello", 3), "hel");
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("日本語テキスト", 3), "日本語");
        assert_eq!(excerpt("", 5), "");
    }

    #[test]
    fn test_pdf_extractor_fails_on_garbage() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(PdfExtractor.extract(&path).is_err());
    }
}
