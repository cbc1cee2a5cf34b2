//! PDF structure operations.

pub mod assemble;
pub mod compress;
pub mod ops;
pub mod overlay;
pub mod probe;
pub mod raster;

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Open a PDF document, handling empty-password encryption.
pub(crate) fn open_document(path: &Path) -> Result<Document> {
    let mut doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;

    if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("decrypted PDF with empty password");
    }

    if doc.get_pages().is_empty() {
        return Err(PdfError::NoPages);
    }

    Ok(doc)
}

/// Verify a written document: the file exists, is non-empty, and has the
/// expected number of pages. Applied uniformly after every page operation.
pub(crate) fn verify_output(path: &Path, expected_pages: usize) -> Result<()> {
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(PdfError::EmptyOutput(path.to_path_buf()));
    }

    let doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;
    let actual = doc.get_pages().len();
    if actual != expected_pages {
        return Err(PdfError::PageCountMismatch {
            expected: expected_pages,
            actual,
        });
    }

    debug!("verified output {}: {} pages, {} bytes", path.display(), actual, len);
    Ok(())
}
