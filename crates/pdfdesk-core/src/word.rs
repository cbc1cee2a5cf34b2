//! PDF to Word (DOCX) conversion.

use std::fs::File;
use std::path::{Path, PathBuf};

use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use image::DynamicImage;
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{ConvertError, OcrError, PdfError};
use crate::ocr::{
    normalize, AccuracyMode, ImagePreprocessor, Progress, TesseractEngine, MIN_OCR_DPI,
};
use crate::pdf::probe::{extract_page_texts, pdf_has_text};
use crate::pdf::raster::{PageRasterizer, PopplerRasterizer};

/// EMUs per inch, the DOCX length unit.
const EMU_PER_INCH: u32 = 914_400;
/// EMUs per pixel at the assumed 96 dpi screen resolution.
const EMU_PER_PIXEL: u32 = EMU_PER_INCH / 96;
/// Embedded page images are scaled to at most this width.
const IMAGE_WIDTH_INCHES: f32 = 6.0;
/// Half-point font size for the searchable text hidden behind layout pages.
const HIDDEN_TEXT_SIZE: usize = 2;

/// How to get content out of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Use the text layer when present, recognize otherwise.
    Auto,
    /// Only use the existing text layer.
    TextOnly,
    /// Always recognize, even over an existing text layer.
    OcrAlways,
    /// Embed each page as an image, keeping the visual layout. The page
    /// text (existing or recognized) is carried along so the document
    /// stays searchable.
    PreserveLayout,
}

#[derive(Debug, Clone)]
pub struct WordSettings {
    pub mode: ConversionMode,
    pub language: String,
    pub dpi: u32,
    pub accuracy: AccuracyMode,
    /// In the text-based modes, also embed the images found on each page.
    pub include_images: bool,
}

impl Default for WordSettings {
    fn default() -> Self {
        Self {
            mode: ConversionMode::Auto,
            language: "eng".to_string(),
            dpi: MIN_OCR_DPI,
            accuracy: AccuracyMode::Balanced,
            include_images: true,
        }
    }
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub total_pages: usize,
    /// Pages that contributed content to the document.
    pub pages_converted: usize,
    pub used_ocr: bool,
}

/// Content gathered for one output page.
struct PageContent {
    text: String,
    images: Vec<Vec<u8>>,
}

impl PageContent {
    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}

/// Converts PDFs into DOCX documents.
pub struct WordConverter<R: PageRasterizer = PopplerRasterizer> {
    engine: TesseractEngine,
    rasterizer: R,
    preprocessor: ImagePreprocessor,
}

impl WordConverter<PopplerRasterizer> {
    /// Converter using `tesseract` and `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_components(TesseractEngine::new(), PopplerRasterizer::new())
    }
}

impl Default for WordConverter<PopplerRasterizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PageRasterizer> WordConverter<R> {
    pub fn with_components(engine: TesseractEngine, rasterizer: R) -> Self {
        Self {
            engine,
            rasterizer,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Convert `input` to a DOCX file at `output`.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        settings: &WordSettings,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<ConversionReport> {
        let has_text = pdf_has_text(input).0;
        let use_ocr = needs_ocr(settings.mode, has_text);

        let report = match settings.mode {
            ConversionMode::PreserveLayout => {
                self.convert_as_images(input, output, settings, use_ocr, progress)?
            }
            _ if use_ocr => self.convert_with_ocr(input, output, settings, progress)?,
            _ => self.convert_from_text_layer(input, output, settings, progress)?,
        };

        info!(
            "converted {} to {} ({} of {} pages, ocr={})",
            input.display(),
            output.display(),
            report.pages_converted,
            report.total_pages,
            report.used_ocr
        );
        Ok(report)
    }

    fn convert_from_text_layer(
        &self,
        input: &Path,
        output: &Path,
        settings: &WordSettings,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<ConversionReport> {
        let texts: Vec<String> = extract_page_texts(input)?
            .into_iter()
            .map(|t| normalize(&t))
            .collect();
        let total = texts.len();

        let mut images: Vec<Vec<Vec<u8>>> = vec![Vec::new(); total];
        if settings.include_images {
            images = embedded_page_images(input, total)?;
        }

        let pages: Vec<PageContent> = texts
            .into_iter()
            .zip(images)
            .map(|(text, images)| PageContent { text, images })
            .collect();
        let pages_converted = pages.iter().filter(|p| !p.is_empty()).count();

        write_docx(&pages, output)?;
        progress(Progress {
            current: total,
            total,
            status: "done".to_string(),
        });
        Ok(ConversionReport {
            output_path: output.to_path_buf(),
            total_pages: total,
            pages_converted,
            used_ocr: false,
        })
    }

    fn convert_with_ocr(
        &self,
        input: &Path,
        output: &Path,
        settings: &WordSettings,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<ConversionReport> {
        // Fail on a missing engine before any rasterization work.
        self.engine.probe()?;

        let dpi = settings.dpi.max(MIN_OCR_DPI);
        let pages = self.rasterizer.rasterize(input, dpi)?;
        let total = pages.page_count();
        let work_dir = TempDir::new().map_err(|e| OcrError::Rasterize(e.to_string()))?;

        let mut contents: Vec<PageContent> = Vec::with_capacity(total);
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
            contents.push(PageContent {
                text: normalize(&raw),
                images: Vec::new(),
            });
            progress(Progress {
                current: number,
                total,
                status: format!("recognized page {number} of {total}"),
            });
        }

        let pages_converted = contents.iter().filter(|p| !p.is_empty()).count();
        write_docx(&contents, output)?;
        Ok(ConversionReport {
            output_path: output.to_path_buf(),
            total_pages: total,
            pages_converted,
            used_ocr: true,
        })
    }

    fn convert_as_images(
        &self,
        input: &Path,
        output: &Path,
        settings: &WordSettings,
        use_ocr: bool,
        progress: &mut dyn FnMut(Progress),
    ) -> crate::Result<ConversionReport> {
        // Fail on a missing engine before any rasterization work.
        if use_ocr {
            self.engine.probe()?;
        }

        let dpi = settings.dpi.max(MIN_OCR_DPI);
        let pages = self.rasterizer.rasterize(input, dpi)?;
        let total = pages.page_count();
        let work_dir = TempDir::new().map_err(|e| OcrError::Rasterize(e.to_string()))?;
        let layer_texts = if use_ocr {
            Vec::new()
        } else {
            extract_page_texts(input).unwrap_or_default()
        };

        let mut docx = Docx::new();
        for (index, page) in pages.enumerate() {
            let number = index + 1;
            let img = page?;
            let png = encode_png(&img)?;
            let (w_emu, h_emu) = fitted_emu(img.width(), img.height());
            let pic = Pic::new(&png).size(w_emu, h_emu);
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));

            // The page keeps searching/selection working even though the
            // visible content is an image.
            let text = if use_ocr {
                let prepared = self.preprocessor.prepare(&img, settings.accuracy);
                let raw = self.engine.recognize_text(
                    &prepared,
                    &settings.language,
                    settings.accuracy,
                    dpi,
                    work_dir.path(),
                )?;
                normalize(&raw)
            } else {
                layer_texts
                    .get(index)
                    .map(|t| normalize(t))
                    .unwrap_or_default()
            };
            if !text.is_empty() {
                docx = docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text(text).size(HIDDEN_TEXT_SIZE)),
                );
            }

            if number < total {
                docx = docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
                );
            }
            progress(Progress {
                current: number,
                total,
                status: format!("embedded page {number} of {total}"),
            });
        }

        pack_docx(docx, output)?;
        Ok(ConversionReport {
            output_path: output.to_path_buf(),
            total_pages: total,
            pages_converted: total,
            used_ocr: use_ocr,
        })
    }
}

/// Whether a mode runs recognition on a document with/without a text layer.
fn needs_ocr(mode: ConversionMode, has_text: bool) -> bool {
    match mode {
        ConversionMode::TextOnly => false,
        ConversionMode::OcrAlways => true,
        ConversionMode::Auto | ConversionMode::PreserveLayout => !has_text,
    }
}

/// One paragraph per text line, the page's embedded images after the text,
/// a page break between pages.
fn write_docx(pages: &[PageContent], output: &Path) -> crate::Result<()> {
    let mut docx = Docx::new();
    let total = pages.len();
    for (index, page) in pages.iter().enumerate() {
        for line in page.text.lines() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
        for bytes in &page.images {
            if let Some(pic) = picture(bytes) {
                docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
            }
        }
        if index + 1 < total {
            docx = docx
                .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
    }
    pack_docx(docx, output)
}

fn picture(bytes: &[u8]) -> Option<Pic> {
    let img = image::load_from_memory(bytes).ok()?;
    let (w_emu, h_emu) = natural_emu(img.width(), img.height());
    Some(Pic::new(bytes).size(w_emu, h_emu))
}

/// Collect the encodable images embedded on each page of a PDF.
///
/// JPEG streams (`DCTDecode`) pass through as-is; flate-compressed 8-bit
/// `DeviceRGB`/`DeviceGray` rasters are re-encoded as PNG. Anything else is
/// skipped.
fn embedded_page_images(input: &Path, total: usize) -> crate::Result<Vec<Vec<Vec<u8>>>> {
    let doc = Document::load(input).map_err(|e| PdfError::Parse(e.to_string()))?;
    let page_map = doc.get_pages();

    let mut result: Vec<Vec<Vec<u8>>> = vec![Vec::new(); total];
    for (page, page_id) in page_map {
        let index = page as usize - 1;
        if index >= total {
            break;
        }
        result[index] = page_image_data(&doc, page_id);
    }
    Ok(result)
}

fn page_image_data(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
    let mut images = Vec::new();
    let Some(resources) = page_resources(doc, page_id) else {
        return images;
    };
    let Ok(xobjects) = resources.get(b"XObject").and_then(Object::as_dict) else {
        return images;
    };

    for (_, value) in xobjects.iter() {
        let stream = match value {
            Object::Reference(id) => match doc.get_object(*id).and_then(Object::as_stream) {
                Ok(s) => s,
                Err(_) => continue,
            },
            Object::Stream(s) => s,
            _ => continue,
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n == b"Image")
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        if let Some(bytes) = image_stream_bytes(stream) {
            images.push(bytes);
        }
    }
    images
}

/// Resources for a page, following `Parent` links for inherited entries.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
    let dict = doc.get_object(node_id).and_then(Object::as_dict).ok()?;
    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }
    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
        return page_resources(doc, *parent_id);
    }
    None
}

fn image_stream_bytes(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    let filter = stream
        .dict
        .get(b"Filter")
        .and_then(Object::as_name)
        .unwrap_or(b"");
    if filter == b"DCTDecode" {
        return Some(stream.content.clone());
    }

    // Flate-compressed raw samples: rebuild a PNG when the layout is simple.
    let data = stream.decompressed_content().ok()?;
    let width = stream.dict.get(b"Width").and_then(Object::as_i64).ok()? as u32;
    let height = stream.dict.get(b"Height").and_then(Object::as_i64).ok()? as u32;
    let bpc = stream
        .dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .ok()?;
    if bpc != 8 {
        debug!("skipping embedded image with {bpc} bits per component");
        return None;
    }
    let colorspace = stream
        .dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .ok()?;
    let img = match colorspace {
        b"DeviceRGB" => DynamicImage::ImageRgb8(image::RgbImage::from_raw(width, height, data)?),
        b"DeviceGray" => {
            DynamicImage::ImageLuma8(image::GrayImage::from_raw(width, height, data)?)
        }
        other => {
            debug!(
                "skipping embedded image in color space {}",
                String::from_utf8_lossy(other)
            );
            return None;
        }
    };
    encode_png(&img).ok()
}

fn pack_docx(mut docx: Docx, output: &Path) -> crate::Result<()> {
    let file = File::create(output)?;
    docx.build()
        .pack(file)
        .map_err(|e| ConvertError::Docx(e.to_string()))?;
    Ok(())
}

fn encode_png(img: &DynamicImage) -> crate::Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)?;
    Ok(out)
}

/// Scale a page image to the standard embed width, keeping aspect ratio.
fn fitted_emu(px_w: u32, px_h: u32) -> (u32, u32) {
    let w_emu = (IMAGE_WIDTH_INCHES * EMU_PER_INCH as f32) as u32;
    let h_emu = (w_emu as f32 * px_h as f32 / px_w as f32) as u32;
    (w_emu, h_emu)
}

/// Natural size at 96 dpi, capped at the standard embed width.
fn natural_emu(px_w: u32, px_h: u32) -> (u32, u32) {
    let natural = px_w * EMU_PER_PIXEL;
    if natural <= (IMAGE_WIDTH_INCHES * EMU_PER_INCH as f32) as u32 {
        (natural, px_h * EMU_PER_PIXEL)
    } else {
        fitted_emu(px_w, px_h)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::DeskError;
    use crate::pdf::ops::tests::{build_pdf_with_text, build_plain_pdf};

    fn no_progress() -> impl FnMut(Progress) {
        |_| {}
    }

    #[test]
    fn text_only_mode_extracts_existing_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.docx");
        build_pdf_with_text(&input, &["first page", "second page"]);

        let report = WordConverter::new()
            .convert(&input, &output, &WordSettings {
                mode: ConversionMode::TextOnly,
                ..WordSettings::default()
            }, &mut no_progress())
            .unwrap();

        assert!(!report.used_ocr);
        assert_eq!(report.total_pages, 2);
        assert_eq!(report.pages_converted, 2);
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn auto_mode_skips_ocr_when_text_present() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.docx");
        build_pdf_with_text(&input, &["has a text layer"]);

        let report = WordConverter::new()
            .convert(&input, &output, &WordSettings::default(), &mut no_progress())
            .unwrap();
        assert!(!report.used_ocr);
    }

    #[test]
    fn ocr_always_fails_fast_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.docx");
        build_plain_pdf(&input, &[200]);

        let converter = WordConverter::with_components(
            TesseractEngine::with_command("/nonexistent/tesseract"),
            PopplerRasterizer::with_command("/nonexistent/pdftoppm"),
        );
        let err = converter
            .convert(&input, &output, &WordSettings {
                mode: ConversionMode::OcrAlways,
                ..WordSettings::default()
            }, &mut no_progress())
            .unwrap_err();
        assert!(matches!(err, DeskError::Ocr(OcrError::EngineMissing(_))));
        assert!(!output.exists());
    }

    #[test]
    fn layout_mode_needs_ocr_only_without_text_layer() {
        assert!(needs_ocr(ConversionMode::PreserveLayout, false));
        assert!(!needs_ocr(ConversionMode::PreserveLayout, true));
        assert!(needs_ocr(ConversionMode::Auto, false));
        assert!(!needs_ocr(ConversionMode::Auto, true));
        assert!(needs_ocr(ConversionMode::OcrAlways, true));
        assert!(!needs_ocr(ConversionMode::TextOnly, false));
    }

    #[test]
    fn layout_mode_on_scanned_pdf_fails_fast_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        let output = dir.path().join("output.docx");
        build_plain_pdf(&input, &[200]);

        let converter = WordConverter::with_components(
            TesseractEngine::with_command("/nonexistent/tesseract"),
            PopplerRasterizer::with_command("/nonexistent/pdftoppm"),
        );
        let err = converter
            .convert(&input, &output, &WordSettings {
                mode: ConversionMode::PreserveLayout,
                ..WordSettings::default()
            }, &mut no_progress())
            .unwrap_err();
        // Recognition is required for the hidden text layer, so a missing
        // engine is reported before rasterization.
        assert!(matches!(err, DeskError::Ocr(OcrError::EngineMissing(_))));
    }

    #[test]
    fn embedded_jpeg_images_are_collected_per_page() {
        use lopdf::{dictionary, Stream};

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("with_image.pdf");
        build_pdf_with_text(&input, &["page with a figure"]);

        // Attach a JPEG XObject to the only page.
        let mut doc = Document::load(&input).unwrap();
        let jpeg = {
            let img = image::RgbImage::from_pixel(12, 8, image::Rgb([200, 40, 40]));
            let mut out = Vec::new();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90)
                .encode_image(&img)
                .unwrap();
            out
        };
        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 12,
                    "Height" => 8,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg.clone(),
            )
            .with_compression(false),
        );
        let page_id = doc.get_pages()[&1];
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        let mut resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap().clone();
        resources.set("XObject", dictionary! { "Im0" => image_id });
        page_dict.set("Resources", resources);
        doc.save(&input).unwrap();

        let images = embedded_page_images(&input, 1).unwrap();
        assert_eq!(images[0].len(), 1);
        assert_eq!(images[0][0], jpeg);
        let decoded = image::load_from_memory(&images[0][0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }

    #[test]
    fn text_mode_with_images_embeds_page_figures() {
        use lopdf::{dictionary, Stream};

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("figure.pdf");
        build_pdf_with_text(&input, &["text and figure"]);

        let mut doc = Document::load(&input).unwrap();
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([0, 120, 255]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
            .encode_image(&img)
            .unwrap();
        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 10,
                    "Height" => 10,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false),
        );
        let page_id = doc.get_pages()[&1];
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        let mut resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap().clone();
        resources.set("XObject", dictionary! { "Im0" => image_id });
        page_dict.set("Resources", resources);
        doc.save(&input).unwrap();

        let with_images = dir.path().join("with.docx");
        let without_images = dir.path().join("without.docx");
        let converter = WordConverter::new();
        converter
            .convert(&input, &with_images, &WordSettings {
                mode: ConversionMode::TextOnly,
                ..WordSettings::default()
            }, &mut no_progress())
            .unwrap();
        converter
            .convert(&input, &without_images, &WordSettings {
                mode: ConversionMode::TextOnly,
                include_images: false,
                ..WordSettings::default()
            }, &mut no_progress())
            .unwrap();

        let with_len = std::fs::metadata(&with_images).unwrap().len();
        let without_len = std::fs::metadata(&without_images).unwrap().len();
        assert!(with_len > without_len, "{with_len} <= {without_len}");
    }

    #[test]
    fn embed_size_keeps_aspect_ratio() {
        let (w, h) = fitted_emu(1000, 500);
        assert_eq!(w, 6 * EMU_PER_INCH);
        assert_eq!(h, w / 2);
    }

    #[test]
    fn small_figures_keep_natural_size() {
        let (w, h) = natural_emu(96, 48);
        assert_eq!(w, EMU_PER_INCH);
        assert_eq!(h, EMU_PER_INCH / 2);
        // Oversized figures fall back to the fitted width.
        let (w, _) = natural_emu(10_000, 100);
        assert_eq!(w, 6 * EMU_PER_INCH);
    }
}
