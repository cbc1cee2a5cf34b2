//! Conversions between images and PDF.

pub mod images_to_pdf;
pub mod pdf_to_images;

pub use images_to_pdf::{images_to_pdf, Margin, Orientation, PageSize};
pub use pdf_to_images::{pdf_to_images_zip, ImageFormat};
