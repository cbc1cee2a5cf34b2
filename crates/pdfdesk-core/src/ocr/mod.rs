//! Optical character recognition: settings, the per-page pipeline, and its
//! supporting stages (preprocessing, the external engine, normalization,
//! output assembly).

use std::path::PathBuf;

use serde::Serialize;

pub mod assemble;
pub mod engine;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;

pub use engine::TesseractEngine;
pub use normalize::normalize;
pub use pipeline::OcrPipeline;
pub use preprocess::ImagePreprocessor;

/// Rasterization floor for recognition. Below this, small glyphs lose too
/// much detail for either engine to read reliably.
pub const MIN_OCR_DPI: u32 = 300;

/// What the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A plain UTF-8 text file.
    Text,
    /// A PDF with the page images visible and the recognized text hidden
    /// underneath, so the file becomes selectable and searchable.
    SearchablePdf,
}

/// Speed/quality trade-off for preprocessing and engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyMode {
    /// Legacy engine, grayscale only.
    Fast,
    /// Neural engine, light cleanup.
    Balanced,
    /// Neural engine, full cleanup including deskew.
    Accurate,
}

/// Knobs for a recognition run.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Tesseract language code, e.g. `eng` or `eng+deu`.
    pub language: String,
    pub output_format: OutputFormat,
    /// Requested rasterization resolution; raised to [`MIN_OCR_DPI`] if lower.
    pub dpi: u32,
    pub accuracy: AccuracyMode,
    /// Recognize even when the document already carries a text layer.
    pub force_ocr: bool,
    /// Insert `--- Page N ---` markers between pages of text output.
    pub include_page_separators: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            output_format: OutputFormat::Text,
            dpi: MIN_OCR_DPI,
            accuracy: AccuracyMode::Balanced,
            force_ocr: false,
            include_page_separators: false,
        }
    }
}

/// Summary of a completed recognition run.
#[derive(Debug, Clone, Serialize)]
pub struct OcrReport {
    pub output_path: PathBuf,
    pub total_pages: usize,
    /// Pages on which at least one word was recognized (or, when recognition
    /// was skipped, pages with extractable text).
    pub pages_with_text: usize,
    /// True when the document already had a text layer and recognition was
    /// bypassed.
    pub skipped_ocr: bool,
}

/// One recognized word with its bounding box in image pixels.
///
/// Coordinates follow image convention: origin top-left, `y` grows downward.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

/// Progress of an in-flight operation, reported once per finished page.
#[derive(Debug, Clone)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub status: String,
}
