//! Text-presence detection and per-page text extraction.

use std::path::Path;

use tracing::{debug, warn};

use super::{open_document, Result};
use crate::error::PdfError;

/// Number of leading pages inspected when deciding whether a PDF
/// already carries extractable text.
const PAGES_TO_CHECK: usize = 3;

/// Check whether a PDF already contains extractable text.
///
/// Inspects at most the first three pages. Returns `(has_text, page_count)`;
/// any read failure yields `(false, 0)` rather than an error, since callers
/// use this purely as a gate before OCR.
pub fn pdf_has_text(path: &Path) -> (bool, usize) {
    let doc = match open_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("text probe failed to open {}: {}", path.display(), e);
            return (false, 0);
        }
    };

    let page_count = doc.get_pages().len();
    for page in 1..=page_count.min(PAGES_TO_CHECK) {
        if let Ok(text) = doc.extract_text(&[page as u32]) {
            if !text.trim().is_empty() {
                return (true, page_count);
            }
        }
    }

    (false, page_count)
}

/// Get the number of pages in a PDF.
pub fn page_count(path: &Path) -> crate::Result<usize> {
    let doc = open_document(path)?;
    Ok(doc.get_pages().len())
}

/// Extract text from every page, one string per page.
///
/// Prefers `pdf-extract` for quality; falls back to lopdf's content-stream
/// extraction when pdf-extract cannot handle the document.
pub fn extract_page_texts(path: &Path) -> Result<Vec<String>> {
    let doc = open_document(path)?;
    let page_count = doc.get_pages().len();

    match pdf_extract::extract_text_by_pages(path) {
        Ok(pages) if pages.len() == page_count => return Ok(pages),
        Ok(pages) => {
            warn!(
                "pdf-extract returned {} pages for a {}-page document, falling back",
                pages.len(),
                page_count
            );
        }
        Err(e) => {
            warn!("pdf-extract failed on {}: {}, falling back", path.display(), e);
        }
    }

    let mut pages = Vec::with_capacity(page_count);
    for page in 1..=page_count {
        let text = doc
            .extract_text(&[page as u32])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        pages.push(text);
    }
    Ok(pages)
}
