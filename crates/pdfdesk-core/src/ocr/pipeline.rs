//! The end-to-end recognition pipeline.
//!
//! A run moves through fixed phases: check for an existing text layer,
//! then either reuse it or rasterize and recognize page by page, then
//! assemble the output. Progress is reported once per finished page.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, info};

use super::assemble::assemble_plain_text;
use super::engine::TesseractEngine;
use super::normalize::normalize;
use super::preprocess::ImagePreprocessor;
use super::{OcrReport, OcrSettings, OutputFormat, Progress, MIN_OCR_DPI};
use crate::error::{OcrError, PdfError};
use crate::pdf::overlay::SearchablePdfBuilder;
use crate::pdf::probe::{extract_page_texts, page_count, pdf_has_text};
use crate::pdf::raster::{PageRasterizer, PopplerRasterizer};
use crate::pdf::verify_output;

/// Orchestrates rasterization, preprocessing, recognition, and assembly.
pub struct OcrPipeline<R: PageRasterizer = PopplerRasterizer> {
    engine: TesseractEngine,
    rasterizer: R,
    preprocessor: ImagePreprocessor,
}

impl OcrPipeline<PopplerRasterizer> {
    /// Pipeline using `tesseract` and `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_components(TesseractEngine::new(), PopplerRasterizer::new())
    }
}

impl Default for OcrPipeline<PopplerRasterizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PageRasterizer> OcrPipeline<R> {
    pub fn with_components(engine: TesseractEngine, rasterizer: R) -> Self {
        Self {
            engine,
            rasterizer,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Recognize `input` and write the result to `output`.
    ///
    /// When the document already carries a text layer and `force_ocr` is
    /// off, recognition is skipped and the existing text is reused.
    pub fn process(
        &self,
        input: &Path,
        output: &Path,
        settings: &OcrSettings,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<OcrReport> {
        progress(Progress {
            current: 0,
            total: 0,
            status: "checking for existing text".to_string(),
        });
        let (has_text, _pages_checked) = pdf_has_text(input);

        if has_text && !settings.force_ocr {
            info!("{} already has a text layer, skipping recognition", input.display());
            return self.reuse_text_layer(input, output, settings, progress);
        }

        // Fail on a missing engine before any rasterization work.
        let version = self.engine.probe()?;
        debug!("recognition engine: {version}");

        let dpi = settings.dpi.max(MIN_OCR_DPI);
        let pages = self.rasterizer.rasterize(input, dpi)?;
        let total = pages.page_count();
        let work_dir = TempDir::new().map_err(|e| OcrError::Rasterize(e.to_string()))?;

        match settings.output_format {
            OutputFormat::Text => {
                self.recognize_to_text(pages, total, dpi, output, settings, &work_dir, progress)
            }
            OutputFormat::SearchablePdf => self.recognize_to_searchable_pdf(
                pages, total, dpi, output, settings, &work_dir, progress,
            ),
        }
    }

    fn reuse_text_layer(
        &self,
        input: &Path,
        output: &Path,
        settings: &OcrSettings,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<OcrReport> {
        match settings.output_format {
            OutputFormat::Text => {
                let texts = extract_page_texts(input)?;
                let total = texts.len();
                let pages: Vec<(usize, String)> = texts
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| (i + 1, normalize(&t)))
                    .collect();
                let pages_with_text = pages.iter().filter(|(_, t)| !t.is_empty()).count();
                let text = assemble_plain_text(&pages, settings.include_page_separators);
                write_text_output(output, &text)?;
                progress(Progress {
                    current: total,
                    total,
                    status: "done".to_string(),
                });
                Ok(OcrReport {
                    output_path: output.to_path_buf(),
                    total_pages: total,
                    pages_with_text,
                    skipped_ocr: true,
                })
            }
            OutputFormat::SearchablePdf => {
                // Already searchable; the copy is the result.
                let total = page_count(input)?;
                fs::copy(input, output)?;
                verify_output(output, total)?;
                progress(Progress {
                    current: total,
                    total,
                    status: "done".to_string(),
                });
                Ok(OcrReport {
                    output_path: output.to_path_buf(),
                    total_pages: total,
                    pages_with_text: total,
                    skipped_ocr: true,
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recognize_to_text(
        &self,
        pages: impl Iterator<Item = Result<image::DynamicImage, OcrError>>,
        total: usize,
        dpi: u32,
        output: &Path,
        settings: &OcrSettings,
        work_dir: &TempDir,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<OcrReport> {
        let mut page_texts: Vec<(usize, String)> = Vec::with_capacity(total);
        for (index, page) in pages.enumerate() {
            let number = index + 1;
            let img = page?;
            let prepared = self.preprocessor.prepare(&img, settings.accuracy);
            let raw = self.engine.recognize_text(
                &prepared,
                &settings.language,
                settings.accuracy,
                dpi,
                work_dir.path(),
            )?;
            page_texts.push((number, normalize(&raw)));
            progress(Progress {
                current: number,
                total,
                status: format!("recognized page {number} of {total}"),
            });
        }

        progress(Progress {
            current: total,
            total,
            status: "assembling output".to_string(),
        });
        let pages_with_text = page_texts.iter().filter(|(_, t)| !t.is_empty()).count();
        let text = assemble_plain_text(&page_texts, settings.include_page_separators);
        write_text_output(output, &text)?;

        info!(
            "recognized {} pages ({} with text) into {}",
            total,
            pages_with_text,
            output.display()
        );
        Ok(OcrReport {
            output_path: output.to_path_buf(),
            total_pages: total,
            pages_with_text,
            skipped_ocr: false,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn recognize_to_searchable_pdf(
        &self,
        pages: impl Iterator<Item = Result<image::DynamicImage, OcrError>>,
        total: usize,
        dpi: u32,
        output: &Path,
        settings: &OcrSettings,
        work_dir: &TempDir,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<OcrReport> {
        let mut builder = SearchablePdfBuilder::new();
        let mut pages_with_text = 0usize;
        for (index, page) in pages.enumerate() {
            let number = index + 1;
            let img = page?;
            let prepared = self.preprocessor.prepare(&img, settings.accuracy);
            let words = self.engine.recognize_words(
                &prepared,
                &settings.language,
                settings.accuracy,
                dpi,
                work_dir.path(),
            )?;
            if !words.is_empty() {
                pages_with_text += 1;
            }
            // The visible layer is the untouched raster; preprocessing only
            // feeds the engine.
            builder.add_page(&img, &words, dpi)?;
            progress(Progress {
                current: number,
                total,
                status: format!("recognized page {number} of {total}"),
            });
        }

        progress(Progress {
            current: total,
            total,
            status: "assembling output".to_string(),
        });
        let mut doc = builder.finish()?;
        doc.save(output).map_err(|e| PdfError::Write(e.to_string()))?;
        verify_output(output, total)?;

        info!(
            "recognized {} pages ({} with text) into {}",
            total,
            pages_with_text,
            output.display()
        );
        Ok(OcrReport {
            output_path: output.to_path_buf(),
            total_pages: total,
            pages_with_text,
            skipped_ocr: false,
        })
    }
}

/// Write assembled text and check the post-condition: the file must exist
/// and, when the result carries any text, must be non-empty. A document of
/// all-blank pages legitimately yields an empty file.
fn write_text_output(path: &Path, text: &str) -> crate::Result<()> {
    fs::write(path, text)?;
    let metadata = fs::metadata(path)?;
    if !text.is_empty() && metadata.len() == 0 {
        return Err(PdfError::EmptyOutput(path.to_path_buf()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::DeskError;
    use crate::pdf::ops::tests::{build_pdf_with_text, build_plain_pdf};
    use crate::pdf::raster::PopplerRasterizer;

    fn no_progress() -> impl FnMut(Progress) {
        |_| {}
    }

    #[test]
    fn text_layer_is_reused_for_text_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.txt");
        build_pdf_with_text(&input, &["alpha beta", "gamma delta"]);

        let pipeline = OcrPipeline::new();
        let settings = OcrSettings::default();
        let report = pipeline
            .process(&input, &output, &settings, &mut no_progress())
            .unwrap();

        assert!(report.skipped_ocr);
        assert_eq!(report.total_pages, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("alpha beta"));
        assert!(text.contains("gamma delta"));
    }

    #[test]
    fn text_layer_reuse_honors_page_separators() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.txt");
        build_pdf_with_text(&input, &["alpha", "beta"]);

        let pipeline = OcrPipeline::new();
        let settings = OcrSettings {
            include_page_separators: true,
            ..OcrSettings::default()
        };
        pipeline
            .process(&input, &output, &settings, &mut no_progress())
            .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.matches("--- Page").count(), 2);
    }

    #[test]
    fn searchable_output_with_text_layer_copies_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.pdf");
        build_pdf_with_text(&input, &["already searchable"]);

        let pipeline = OcrPipeline::new();
        let settings = OcrSettings {
            output_format: OutputFormat::SearchablePdf,
            ..OcrSettings::default()
        };
        let report = pipeline
            .process(&input, &output, &settings, &mut no_progress())
            .unwrap();

        assert!(report.skipped_ocr);
        assert_eq!(
            std::fs::read(&input).unwrap(),
            std::fs::read(&output).unwrap()
        );
    }

    #[test]
    fn missing_engine_fails_before_rasterization() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.txt");
        build_plain_pdf(&input, &[200]);

        let pipeline = OcrPipeline::with_components(
            TesseractEngine::with_command("/nonexistent/tesseract"),
            PopplerRasterizer::with_command("/nonexistent/pdftoppm"),
        );
        let err = pipeline
            .process(&input, &output, &OcrSettings::default(), &mut no_progress())
            .unwrap_err();
        assert!(matches!(err, DeskError::Ocr(OcrError::EngineMissing(_))));
        assert!(!output.exists());
    }

    #[test]
    fn blank_document_text_output_may_be_empty() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("blank.txt");
        write_text_output(&output, "").unwrap();
        assert!(output.exists());
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);

        write_text_output(&output, "recognized").unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "recognized");
    }

    #[test]
    fn progress_reaches_total_on_skip_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.txt");
        build_pdf_with_text(&input, &["one", "two", "three"]);

        let mut last: Option<Progress> = None;
        let mut record = |p: Progress| last = Some(p);
        OcrPipeline::new()
            .process(&input, &output, &OcrSettings::default(), &mut record)
            .unwrap();
        let last = last.unwrap();
        assert_eq!(last.current, 3);
        assert_eq!(last.total, 3);
        assert_eq!(last.status, "done");
    }
}
