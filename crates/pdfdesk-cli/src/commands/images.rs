//! Image conversion commands - images-to-pdf and pdf-to-images.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::convert::{
    images_to_pdf, pdf_to_images_zip, ImageFormat, Margin, Orientation, PageSize,
};
use pdfdesk_core::PopplerRasterizer;

/// Arguments for the images-to-pdf command.
#[derive(Args)]
pub struct ImagesToPdfArgs {
    /// Input image files (JPEG or PNG), one page each
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Page size
    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Page orientation
    #[arg(long, value_enum, default_value = "portrait")]
    orientation: OrientationArg,

    /// Page margin
    #[arg(long, value_enum, default_value = "none")]
    margin: MarginArg,
}

/// Arguments for the pdf-to-images command.
#[derive(Args)]
pub struct PdfToImagesArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output ZIP archive
    #[arg(short, long)]
    output: PathBuf,

    /// Image format for the exported pages
    #[arg(short, long, value_enum, default_value = "png")]
    format: FormatArg,

    /// Rasterization resolution
    #[arg(long, default_value = "150")]
    dpi: u32,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PageSizeArg {
    A4,
    Letter,
    Legal,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum MarginArg {
    None,
    Small,
    Medium,
    Large,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    Png,
    Jpeg,
}

impl From<PageSizeArg> for PageSize {
    fn from(value: PageSizeArg) -> Self {
        match value {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

impl From<MarginArg> for Margin {
    fn from(value: MarginArg) -> Self {
        match value {
            MarginArg::None => Margin::None,
            MarginArg::Small => Margin::Small,
            MarginArg::Medium => Margin::Medium,
            MarginArg::Large => Margin::Large,
        }
    }
}

impl From<FormatArg> for ImageFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

pub async fn run_images_to_pdf(args: ImagesToPdfArgs) -> anyhow::Result<()> {
    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    let pages = images_to_pdf(
        &args.inputs,
        &args.output,
        args.page_size.into(),
        args.orientation.into(),
        args.margin.into(),
    )?;
    println!(
        "{} Combined {} images into {}",
        style("✓").green(),
        pages,
        args.output.display()
    );
    Ok(())
}

pub async fn run_pdf_to_images(args: PdfToImagesArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let rasterizer = PopplerRasterizer::new();
    let pages = pdf_to_images_zip(
        &rasterizer,
        &args.input,
        &args.output,
        args.format.into(),
        args.dpi,
    )?;
    println!(
        "{} Exported {} pages into {}",
        style("✓").green(),
        pages,
        args.output.display()
    );
    Ok(())
}
