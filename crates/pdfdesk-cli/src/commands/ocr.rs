//! OCR command - recognize text from a PDF.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::{AccuracyMode, OcrPipeline, OcrSettings, OutputFormat};

use crate::worker::run_with_progress;

/// Arguments for the ocr command.
#[derive(Args)]
pub struct OcrArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (.txt or .pdf depending on --format)
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Recognition language, e.g. eng or eng+deu
    #[arg(short, long, default_value = "eng")]
    lang: String,

    /// Rasterization resolution
    #[arg(long, default_value = "300")]
    dpi: u32,

    /// Speed/quality trade-off
    #[arg(short, long, value_enum, default_value = "balanced")]
    accuracy: AccuracyArg,

    /// Recognize even if the PDF already has a text layer
    #[arg(long)]
    force: bool,

    /// Insert "--- Page N ---" markers between pages of text output
    #[arg(long)]
    page_separators: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    /// Plain text file
    Text,
    /// PDF with an invisible text layer
    Searchable,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AccuracyArg {
    /// Fastest, legacy engine
    Fast,
    /// Neural engine with light cleanup
    Balanced,
    /// Neural engine with full cleanup and deskew
    Accurate,
}

impl From<AccuracyArg> for AccuracyMode {
    fn from(value: AccuracyArg) -> Self {
        match value {
            AccuracyArg::Fast => AccuracyMode::Fast,
            AccuracyArg::Balanced => AccuracyMode::Balanced,
            AccuracyArg::Accurate => AccuracyMode::Accurate,
        }
    }
}

pub async fn run(args: OcrArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let settings = OcrSettings {
        language: args.lang.clone(),
        output_format: match args.format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Searchable => OutputFormat::SearchablePdf,
        },
        dpi: args.dpi,
        accuracy: args.accuracy.into(),
        force_ocr: args.force,
        include_page_separators: args.page_separators,
    };

    let input = args.input.clone();
    let output = args.output.clone();
    let report = run_with_progress(move |progress| {
        OcrPipeline::new().process(&input, &output, &settings, progress)
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.skipped_ocr {
        println!(
            "{} Document already has a text layer; reused it",
            style("ℹ").blue()
        );
    }
    println!(
        "{} Recognized {} pages ({} with text) into {}",
        style("✓").green(),
        report.total_pages,
        report.pages_with_text,
        report.output_path.display()
    );
    Ok(())
}
