//! Searchable PDF construction: a visible page image with an invisible
//! text layer underneath the recognized words.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfError;
use crate::ocr::WordBox;

const POINTS_PER_INCH: f32 = 72.0;
const JPEG_QUALITY: u8 = 85;
const MIN_FONT_SIZE: f32 = 6.0;

/// Incrementally builds a searchable PDF, one page per rasterized image.
pub struct SearchablePdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl SearchablePdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        // One shared base-14 font for the hidden text; it is never rendered,
        // only matched against during text search.
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// Append a page showing `img` full-bleed, with `words` as an invisible
    /// text layer. `dpi` is the resolution `img` was rasterized at and fixes
    /// the pixel-to-point mapping.
    pub fn add_page(
        &mut self,
        img: &DynamicImage,
        words: &[WordBox],
        dpi: u32,
    ) -> Result<(), PdfError> {
        let (px_w, px_h) = (img.width(), img.height());
        let page_w = px_w as f32 / dpi as f32 * POINTS_PER_INCH;
        let page_h = px_h as f32 / dpi as f32 * POINTS_PER_INCH;

        let image_id = self.embed_jpeg(img)?;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w.into(),
                    0.into(),
                    0.into(),
                    page_h.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            // Render mode 3: neither fill nor stroke, text is invisible.
            Operation::new("Tr", vec![3.into()]),
        ];

        for word in words {
            if word.text.trim().is_empty() {
                continue;
            }
            let font_size =
                (word.height as f32 / dpi as f32 * POINTS_PER_INCH * 0.8).max(MIN_FONT_SIZE);
            let x = word.x as f32 / dpi as f32 * POINTS_PER_INCH;
            // PDF user space grows upward from the bottom-left corner; image
            // coordinates grow downward, so the baseline sits at page height
            // minus the box bottom.
            let y = page_h - (word.y + word.height) as f32 / dpi as f32 * POINTS_PER_INCH;

            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F0".to_vec()), font_size.into()],
            ));
            ops.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    x.into(),
                    y.into(),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(fold_latin1(&word.text))],
            ));
        }
        ops.push(Operation::new("ET", vec![]));

        let content = Content { operations: ops };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Write(e.to_string()))?;
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, encoded));

        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
            "Font" => dictionary! { "F0" => Object::Reference(self.font_id) },
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                page_w.into(),
                page_h.into(),
            ],
            "Resources" => resources,
            "Contents" => Object::Reference(content_id),
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Finalize the document.
    pub fn finish(mut self) -> Result<Document, PdfError> {
        if self.kids.is_empty() {
            return Err(PdfError::NoPages);
        }
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc
            .trailer
            .set("Root", Object::Reference(catalog_id));
        self.doc.renumber_objects();
        self.doc.compress();
        Ok(self.doc)
    }

    fn embed_jpeg(&mut self, img: &DynamicImage) -> Result<ObjectId, PdfError> {
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
        // Already JPEG-compressed; a second flate pass would only add bytes.
        let stream = Stream::new(dict, jpeg).with_compression(false);
        Ok(self.doc.add_object(stream))
    }
}

impl Default for SearchablePdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold recognized text into the WinAnsi (latin-1) range the hidden layer's
/// font can address; anything outside maps to `?` so search still finds the
/// surrounding words.
fn fold_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn white_page(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(w, h, image::Rgb([255, 255, 255])))
    }

    #[test]
    fn builds_pdf_with_one_page_per_image() {
        let mut builder = SearchablePdfBuilder::new();
        let img = white_page(850, 1100);
        let words = vec![WordBox {
            text: "hello".to_string(),
            x: 100,
            y: 200,
            width: 120,
            height: 40,
            confidence: 91.0,
        }];
        builder.add_page(&img, &words, 100).unwrap();
        builder.add_page(&img, &[], 100).unwrap();
        let doc = builder.finish().unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn page_box_follows_dpi() {
        let mut builder = SearchablePdfBuilder::new();
        // 300 dpi letter-size raster: 2550 x 3300 px -> 612 x 792 pt.
        builder.add_page(&white_page(2550, 3300), &[], 300).unwrap();
        let doc = builder.finish().unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let w = media_box[2].as_float().unwrap();
        let h = media_box[3].as_float().unwrap();
        assert!((w - 612.0).abs() < 0.1, "width {w}");
        assert!((h - 792.0).abs() < 0.1, "height {h}");
    }

    #[test]
    fn empty_builder_refuses_to_finish() {
        let builder = SearchablePdfBuilder::new();
        assert!(matches!(builder.finish(), Err(PdfError::NoPages)));
    }

    #[test]
    fn latin1_fold_replaces_out_of_range_chars() {
        assert_eq!(fold_latin1("café"), b"caf\xe9".to_vec());
        assert_eq!(fold_latin1("日本"), b"??".to_vec());
    }
}
