//! Error types for the pdfdesk-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the pdfdesk library.
#[derive(Error, Debug)]
pub enum DeskError {
    /// PDF structure or page-operation error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR pipeline error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Document conversion error.
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF structure and page operations.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {page} (document has {page_count} pages)")]
    InvalidPage { page: u32, page_count: u32 },

    /// Invalid page range requested.
    #[error("invalid page range {start}-{end} (document has {page_count} pages)")]
    InvalidRange {
        start: u32,
        end: u32,
        page_count: u32,
    },

    /// No pages were selected for an operation that requires some.
    #[error("no pages selected")]
    EmptySelection,

    /// An operation would remove every page of the document.
    #[error("cannot delete all pages from the PDF")]
    DeleteAllPages,

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Output verification failed: the written file is missing or empty.
    #[error("output file is missing or empty: {0}")]
    EmptyOutput(PathBuf),

    /// Output verification failed: the page count does not match.
    #[error("output has {actual} pages, expected {expected}")]
    PageCountMismatch { expected: usize, actual: usize },

    /// Failed to write the output document.
    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The external recognition engine was not found or failed its probe.
    #[error("recognition engine unavailable: {0}")]
    EngineMissing(String),

    /// The recognition engine failed on a page.
    #[error("recognition failed: {0}")]
    EngineFailed(String),

    /// Page rasterization failed.
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to document conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input file is not a supported image.
    #[error("unsupported or unreadable image: {0}")]
    UnsupportedImage(PathBuf),

    /// No input images were given.
    #[error("no input images")]
    NoImages,

    /// Failed to build the Word document.
    #[error("failed to build DOCX: {0}")]
    Docx(String),

    /// Failed to build the ZIP archive.
    #[error("failed to build ZIP: {0}")]
    Zip(String),
}

/// Result type for the pdfdesk library.
pub type Result<T> = std::result::Result<T, DeskError>;
