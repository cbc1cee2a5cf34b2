//! PDF compression.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::{open_document, verify_output};
use crate::error::PdfError;

/// How aggressively to compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressLevel {
    /// Lossless rewrite only: drops incremental updates and dead xref entries.
    Low,
    /// Rewrite plus stream compression.
    Medium,
    /// Rewrite, stream compression, and pruning of unreferenced objects.
    High,
}

/// Outcome of a compression run.
#[derive(Debug, Clone, Serialize)]
pub struct CompressReport {
    pub original_size: u64,
    pub new_size: u64,
    pub size_reduction: i64,
    pub reduction_percentage: f64,
    pub total_pages: usize,
}

impl CompressReport {
    fn new(original_size: u64, new_size: u64, total_pages: usize) -> Self {
        let size_reduction = original_size as i64 - new_size as i64;
        let reduction_percentage = if original_size > 0 {
            size_reduction as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };
        Self {
            original_size,
            new_size,
            size_reduction,
            reduction_percentage,
            total_pages,
        }
    }
}

/// Compress a PDF, returning size statistics.
pub fn compress_pdf(
    input: &Path,
    output: &Path,
    level: CompressLevel,
) -> crate::Result<CompressReport> {
    let original_size = std::fs::metadata(input)?.len();

    let mut doc = open_document(input)?;
    let total_pages = doc.get_pages().len();

    match level {
        CompressLevel::Low => {}
        CompressLevel::Medium => {
            doc.compress();
        }
        CompressLevel::High => {
            doc.compress();
            doc.prune_objects();
        }
    }

    doc.save(output).map_err(|e| PdfError::Write(e.to_string()))?;
    verify_output(output, total_pages)?;

    let new_size = std::fs::metadata(output)?.len();
    let report = CompressReport::new(original_size, new_size, total_pages);
    info!(
        "compressed {}: {} -> {} bytes ({:.1}%)",
        input.display(),
        report.original_size,
        report.new_size,
        report.reduction_percentage
    );
    Ok(report)
}

/// Format a byte count for human display.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
