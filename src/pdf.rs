//! PDF text extraction
//!
//! Extracts text content from uploaded pitch decks using lopdf. Pages that
//! fail to decode are skipped rather than failing the whole document.

use crate::errors::AppError;
use std::path::Path;
use tracing::{debug, warn};

/// Structural facts about an extracted document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentMetadata {
    pub length: usize,
    pub word_count: usize,
}

/// Extract text content from a PDF file.
pub fn extract_text(path: &Path) -> Result<String, AppError> {
    let doc = lopdf::Document::load(path).map_err(|e| AppError::PdfParseError {
        path: path.display().to_string(),
        message: format!("failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for (&page_num, _) in pages.iter() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AppError::PdfParseError {
            path: path.display().to_string(),
            message: "no text content extracted from PDF".to_string(),
        });
    }

    let cleaned = clean_text(&text);
    debug!(
        original_len = text.len(),
        cleaned_len = cleaned.len(),
        "Text extraction complete"
    );

    Ok(cleaned)
}

/// Run text extraction on the blocking pool. lopdf decoding is CPU-bound.
pub async fn extract_text_from(path: std::path::PathBuf) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("extraction task failed: {}", e)))?
}

/// Compute length and word count for an extracted document.
pub fn extract_metadata(text: &str) -> DocumentMetadata {
    DocumentMetadata {
        length: text.len(),
        word_count: text.split_whitespace().count(),
    }
}

/// Collapse runs of whitespace left behind by PDF layout operators.
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;

    for ch in text.chars() {
        if ch == '\n' {
            out.push('\n');
            last_was_space = true;
        } else if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_metadata() {
        let meta = extract_metadata("We have 10,000 paying customers");
        assert_eq!(meta.length, 31);
        assert_eq!(meta.word_count, 5);
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a   b\t c"), "a b c");
        assert_eq!(clean_text("  line one \n line two  "), "line one \nline two");
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = extract_text(Path::new("/nonexistent/deck.pdf")).unwrap_err();
        assert!(matches!(err, AppError::PdfParseError { .. }));
    }
}
