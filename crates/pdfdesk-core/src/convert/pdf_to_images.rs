//! Export PDF pages as image files bundled in a ZIP archive.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ConvertError;
use crate::pdf::raster::PageRasterizer;

const JPEG_QUALITY: u8 = 95;

/// Encoding for exported pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Rasterize every page of `input` at `dpi` and write them into a ZIP
/// archive at `output`, named `{stem}_page_{NNN}.{ext}`. Returns the page
/// count.
pub fn pdf_to_images_zip<R: PageRasterizer>(
    rasterizer: &R,
    input: &Path,
    output: &Path,
    format: ImageFormat,
    dpi: u32,
) -> crate::Result<usize> {
    let result = write_archive(rasterizer, input, output, format, dpi);
    if result.is_err() {
        // Never leave a half-written archive behind.
        let _ = std::fs::remove_file(output);
    }
    result
}

fn write_archive<R: PageRasterizer>(
    rasterizer: &R,
    input: &Path,
    output: &Path,
    format: ImageFormat,
    dpi: u32,
) -> crate::Result<usize> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let pages = rasterizer.rasterize(input, dpi)?;
    let total = pages.page_count();

    let file = File::create(output)?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (index, page) in pages.enumerate() {
        let img = page?;
        let name = page_file_name(stem, index + 1, format);
        archive
            .start_file(&name, options)
            .map_err(|e| ConvertError::Zip(e.to_string()))?;
        let encoded = encode_page(&img, format)?;
        archive.write_all(&encoded)?;
    }

    archive
        .finish()
        .map_err(|e| ConvertError::Zip(e.to_string()))?;

    info!("exported {} pages from {} into {}", total, input.display(), output.display());
    Ok(total)
}

fn page_file_name(stem: &str, page: usize, format: ImageFormat) -> String {
    format!("{}_page_{:03}.{}", stem, page, format.extension())
}

fn encode_page(img: &DynamicImage, format: ImageFormat) -> crate::Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut out = Vec::new();
    match format {
        ImageFormat::Png => {
            PngEncoder::new(&mut out).write_image(
                rgb.as_raw(),
                w,
                h,
                image::ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{DeskError, OcrError};
    use crate::pdf::raster::PopplerRasterizer;

    #[test]
    fn page_names_are_zero_padded() {
        assert_eq!(page_file_name("scan", 1, ImageFormat::Png), "scan_page_001.png");
        assert_eq!(page_file_name("scan", 42, ImageFormat::Jpeg), "scan_page_042.jpg");
    }

    #[test]
    fn encode_page_produces_valid_images() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([10, 20, 30]),
        ));
        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            let bytes = encode_page(&img, format).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.width(), 8);
            assert_eq!(decoded.height(), 8);
        }
    }

    #[test]
    fn failed_run_leaves_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.pdf");
        let output = dir.path().join("out.zip");
        let rasterizer = PopplerRasterizer::with_command("/nonexistent/pdftoppm");
        let err =
            pdf_to_images_zip(&rasterizer, &input, &output, ImageFormat::Png, 150).unwrap_err();
        assert!(matches!(err, DeskError::Ocr(OcrError::EngineMissing(_))));
        assert!(!output.exists());
    }
}
