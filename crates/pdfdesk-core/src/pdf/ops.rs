//! Page operations: merge, split, delete, extract.
//!
//! Every operation validates its input before touching the output path and
//! verifies the written document afterwards (non-empty file, expected page
//! count).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::info;

use super::assemble::{assemble, PageSelection};
use super::{open_document, verify_output, Result};
use crate::error::PdfError;

/// Merge multiple PDFs into one, pages of each input in order.
///
/// Returns the total page count of the merged document.
pub fn merge_pdfs(inputs: &[PathBuf], output: &Path) -> crate::Result<usize> {
    if inputs.is_empty() {
        return Err(PdfError::EmptySelection.into());
    }

    let mut sources = Vec::with_capacity(inputs.len());
    let mut total = 0usize;
    for input in inputs {
        let doc = open_document(input)?;
        let page_count = doc.get_pages().len();
        total += page_count;
        sources.push(PageSelection {
            doc,
            pages: (1..=page_count as u32).collect(),
        });
    }

    save_assembled(sources, output, total)?;
    info!("merged {} files into {} ({} pages)", inputs.len(), output.display(), total);
    Ok(total)
}

/// Extract an inclusive 1-indexed page range into a new PDF.
pub fn split_range(input: &Path, output: &Path, start: u32, end: u32) -> crate::Result<usize> {
    let doc = open_document(input)?;
    let page_count = doc.get_pages().len() as u32;

    if start < 1 || end > page_count || start > end {
        return Err(PdfError::InvalidRange {
            start,
            end,
            page_count,
        }
        .into());
    }

    let expected = (end - start + 1) as usize;
    save_assembled(
        vec![PageSelection {
            doc,
            pages: (start..=end).collect(),
        }],
        output,
        expected,
    )?;
    Ok(expected)
}

/// Split a PDF into one single-page file per page.
///
/// Output files are named `{stem}_page_{NNN}.pdf` inside `out_dir`.
/// Returns the written paths in page order.
pub fn split_into_pages(input: &Path, out_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let data = std::fs::read(input)?;
    let doc = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;
    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(PdfError::NoPages.into());
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(page_count);
    for page in 1..=page_count as u32 {
        let doc = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;
        let path = out_dir.join(format!("{}_page_{:03}.pdf", stem, page));
        save_assembled(
            vec![PageSelection {
                doc,
                pages: vec![page],
            }],
            &path,
            1,
        )?;
        written.push(path);
    }

    info!("split {} into {} single-page files", input.display(), written.len());
    Ok(written)
}

/// Delete the given 1-indexed pages from a PDF.
///
/// Deleting every page is a validation error; no output file is produced.
/// Returns the remaining page count.
pub fn delete_pages(input: &Path, output: &Path, pages: &[u32]) -> crate::Result<usize> {
    let doc = open_document(input)?;
    let page_count = doc.get_pages().len() as u32;

    validate_page_numbers(pages, page_count)?;

    let to_delete: BTreeSet<u32> = pages.iter().copied().collect();
    let remaining: Vec<u32> = (1..=page_count)
        .filter(|p| !to_delete.contains(p))
        .collect();

    if remaining.is_empty() {
        return Err(PdfError::DeleteAllPages.into());
    }

    let expected = remaining.len();
    save_assembled(
        vec![PageSelection {
            doc,
            pages: remaining,
        }],
        output,
        expected,
    )?;
    Ok(expected)
}

/// Extract the given 1-indexed pages into a new PDF.
///
/// With `preserve_order` the output follows the requested sequence
/// (duplicates allowed); otherwise pages are sorted ascending with
/// duplicates removed.
pub fn extract_pages(
    input: &Path,
    output: &Path,
    pages: &[u32],
    preserve_order: bool,
) -> crate::Result<usize> {
    if pages.is_empty() {
        return Err(PdfError::EmptySelection.into());
    }

    let doc = open_document(input)?;
    let page_count = doc.get_pages().len() as u32;
    validate_page_numbers(pages, page_count)?;

    let ordered: Vec<u32> = if preserve_order {
        pages.to_vec()
    } else {
        pages.iter().copied().collect::<BTreeSet<u32>>().into_iter().collect()
    };

    let expected = ordered.len();
    save_assembled(
        vec![PageSelection {
            doc,
            pages: ordered,
        }],
        output,
        expected,
    )?;
    Ok(expected)
}

fn validate_page_numbers(pages: &[u32], page_count: u32) -> Result<()> {
    for &page in pages {
        if page < 1 || page > page_count {
            return Err(PdfError::InvalidPage { page, page_count });
        }
    }
    Ok(())
}

fn save_assembled(
    sources: Vec<PageSelection>,
    output: &Path,
    expected_pages: usize,
) -> Result<()> {
    let mut doc = assemble(sources)?;
    doc.save(output).map_err(|e| PdfError::Write(e.to_string()))?;
    verify_output(output, expected_pages)
}
