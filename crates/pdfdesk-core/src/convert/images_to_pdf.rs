//! Combine image files into a single PDF, one image per page.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::info;

use crate::error::{ConvertError, PdfError};
use crate::pdf::verify_output;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
/// Images without embedded resolution are assumed to be screen captures.
const ASSUMED_IMAGE_DPI: f32 = 96.0;
const JPEG_QUALITY: u8 = 95;

/// Target paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait dimensions in millimeters.
    pub fn dims_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Uniform page margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    None,
    Small,
    Medium,
    Large,
}

impl Margin {
    pub fn mm(self) -> f32 {
        match self {
            Margin::None => 0.0,
            Margin::Small => 12.7,
            Margin::Medium => 25.4,
            Margin::Large => 38.1,
        }
    }
}

fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Build a PDF from `inputs`, one page per image, each image scaled to fit
/// inside the page margins and centered. Returns the page count.
///
/// Supported inputs are JPEG and PNG files; anything else is rejected
/// before any output is written.
pub fn images_to_pdf(
    inputs: &[PathBuf],
    output: &Path,
    page_size: PageSize,
    orientation: Orientation,
    margin: Margin,
) -> crate::Result<usize> {
    if inputs.is_empty() {
        return Err(ConvertError::NoImages.into());
    }
    for path in inputs {
        if !has_supported_extension(path) {
            return Err(ConvertError::UnsupportedImage(path.clone()).into());
        }
    }

    let (mut page_w_mm, mut page_h_mm) = page_size.dims_mm();
    if orientation == Orientation::Landscape {
        std::mem::swap(&mut page_w_mm, &mut page_h_mm);
    }
    let page_w = mm_to_pt(page_w_mm);
    let page_h = mm_to_pt(page_h_mm);
    let margin_pt = mm_to_pt(margin.mm());
    let content_w = page_w - 2.0 * margin_pt;
    let content_h = page_h - 2.0 * margin_pt;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(inputs.len());

    for path in inputs {
        let img = image::open(path).map_err(|_| ConvertError::UnsupportedImage(path.clone()))?;

        let image_id = embed_jpeg(&mut doc, &img)?;
        let (px_w, px_h) = (img.width() as f32, img.height() as f32);
        let natural_w = px_w / ASSUMED_IMAGE_DPI * 72.0;
        let natural_h = px_h / ASSUMED_IMAGE_DPI * 72.0;
        let scale = (content_w / natural_w).min(content_h / natural_h);
        let draw_w = natural_w * scale;
        let draw_h = natural_h * scale;
        let x = margin_pt + (content_w - draw_w) / 2.0;
        let y = margin_pt + (content_h - draw_h) / 2.0;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_w.into(),
                        0.into(),
                        0.into(),
                        draw_h.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Write(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let total = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.renumber_objects();
    doc.compress();

    if let Err(e) = save_and_verify(&mut doc, output, total) {
        // Never leave a half-written document behind.
        let _ = std::fs::remove_file(output);
        return Err(e);
    }

    info!("built {} from {} images", output.display(), total);
    Ok(total)
}

fn save_and_verify(doc: &mut Document, output: &Path, total: usize) -> crate::Result<()> {
    doc.save(output).map_err(|e| PdfError::Write(e.to_string()))?;
    verify_output(output, total)?;
    Ok(())
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "jpg" || e == "jpeg" || e == "png"
        })
        .unwrap_or(false)
}

fn embed_jpeg(doc: &mut Document, img: &DynamicImage) -> crate::Result<lopdf::ObjectId> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| PdfError::Write(e.to_string()))?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => w as i64,
        "Height" => h as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    Ok(doc.add_object(Stream::new(dict, jpeg).with_compression(false)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::DeskError;

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([120, 60, 200]));
        img.save(path).unwrap();
    }

    #[test]
    fn builds_one_page_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 640, 480);
        write_png(&b, 480, 640);
        let output = dir.path().join("out.pdf");

        let pages = images_to_pdf(
            &[a, b],
            &output,
            PageSize::A4,
            Orientation::Portrait,
            Margin::Medium,
        )
        .unwrap();
        assert_eq!(pages, 2);
        assert!(output.exists());
    }

    #[test]
    fn a4_landscape_swaps_page_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("img.png");
        write_png(&input, 100, 100);
        let output = dir.path().join("out.pdf");

        images_to_pdf(
            &[input],
            &output,
            PageSize::A4,
            Orientation::Landscape,
            Margin::None,
        )
        .unwrap();

        let doc = Document::load(&output).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let w = media_box[2].as_float().unwrap();
        let h = media_box[3].as_float().unwrap();
        // 297 x 210 mm in points.
        assert!((w - 841.89).abs() < 0.1, "width {w}");
        assert!((h - 595.28).abs() < 0.1, "height {h}");
    }

    #[test]
    fn rejects_empty_input_list() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let err = images_to_pdf(
            &[],
            &output,
            PageSize::Letter,
            Orientation::Portrait,
            Margin::None,
        )
        .unwrap_err();
        assert!(matches!(err, DeskError::Convert(ConvertError::NoImages)));
    }

    #[test]
    fn rejects_unsupported_extension_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, "not an image").unwrap();
        let output = dir.path().join("out.pdf");

        let err = images_to_pdf(
            &[bad],
            &output,
            PageSize::A4,
            Orientation::Portrait,
            Margin::None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Convert(ConvertError::UnsupportedImage(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn rejects_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("fake.png");
        std::fs::write(&bad, "not a png at all").unwrap();
        let output = dir.path().join("out.pdf");

        let err = images_to_pdf(
            &[bad],
            &output,
            PageSize::A4,
            Orientation::Portrait,
            Margin::None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Convert(ConvertError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn margin_sizes_in_millimeters() {
        assert_eq!(Margin::None.mm(), 0.0);
        assert_eq!(Margin::Small.mm(), 12.7);
        assert_eq!(Margin::Medium.mm(), 25.4);
        assert_eq!(Margin::Large.mm(), 38.1);
    }
}
