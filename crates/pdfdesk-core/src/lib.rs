//! Core library for pdfdesk document operations.
//!
//! This crate provides:
//! - PDF page operations (merge, split, delete, extract, compress)
//! - An OCR pipeline producing plain text or searchable PDFs
//! - Image-to-PDF and PDF-to-images conversion
//! - PDF-to-Word conversion
//!
//! Rasterization and text recognition delegate to the external `pdftoppm`
//! and `tesseract` binaries; PDF structure work uses `lopdf`.

pub mod convert;
pub mod error;
pub(crate) mod exec;
pub mod ocr;
pub mod pdf;
pub mod word;

pub use error::{ConvertError, DeskError, OcrError, PdfError, Result};
pub use ocr::{
    AccuracyMode, OcrPipeline, OcrReport, OcrSettings, OutputFormat, Progress, WordBox,
};
pub use pdf::compress::{compress_pdf, CompressLevel, CompressReport};
pub use pdf::probe::{page_count, pdf_has_text};
pub use pdf::raster::{PageRasterizer, PopplerRasterizer};
pub use word::{ConversionMode, ConversionReport, WordConverter, WordSettings};
