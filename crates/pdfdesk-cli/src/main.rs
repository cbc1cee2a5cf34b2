//! CLI for PDF page operations, OCR, and conversions.

mod commands;
mod pages;
mod worker;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{compress, images, merge, ocr, pages as page_ops, split, tools, word};

/// PDF desktop toolbox - merge, split, compress, OCR, and convert PDFs
#[derive(Parser)]
#[command(name = "pdfdesk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge several PDFs into one
    Merge(merge::MergeArgs),

    /// Split a PDF by page range or into single pages
    Split(split::SplitArgs),

    /// Delete pages from a PDF
    Delete(page_ops::DeleteArgs),

    /// Extract pages into a new PDF
    Extract(page_ops::ExtractArgs),

    /// Compress a PDF
    Compress(compress::CompressArgs),

    /// Combine images into a PDF
    ImagesToPdf(images::ImagesToPdfArgs),

    /// Export PDF pages as images in a ZIP archive
    PdfToImages(images::PdfToImagesArgs),

    /// Recognize text, producing plain text or a searchable PDF
    Ocr(ocr::OcrArgs),

    /// Convert a PDF to a Word document
    Word(word::WordArgs),

    /// Check the external tools the OCR commands depend on
    Tools(tools::ToolsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Merge(args) => merge::run(args).await,
        Commands::Split(args) => split::run(args).await,
        Commands::Delete(args) => page_ops::run_delete(args).await,
        Commands::Extract(args) => page_ops::run_extract(args).await,
        Commands::Compress(args) => compress::run(args).await,
        Commands::ImagesToPdf(args) => images::run_images_to_pdf(args).await,
        Commands::PdfToImages(args) => images::run_pdf_to_images(args).await,
        Commands::Ocr(args) => ocr::run(args).await,
        Commands::Word(args) => word::run(args).await,
        Commands::Tools(args) => tools::run(args).await,
    }
}
