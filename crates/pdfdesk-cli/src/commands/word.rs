//! Word command - convert a PDF to DOCX.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::{ConversionMode, WordConverter, WordSettings};

use super::ocr::AccuracyArg;
use crate::worker::run_with_progress;

/// Arguments for the word command.
#[derive(Args)]
pub struct WordArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output DOCX file
    #[arg(short, long)]
    output: PathBuf,

    /// Conversion mode
    #[arg(short, long, value_enum, default_value = "auto")]
    mode: ModeArg,

    /// Recognition language, used when OCR runs
    #[arg(short, long, default_value = "eng")]
    lang: String,

    /// Rasterization resolution, used when OCR runs
    #[arg(long, default_value = "300")]
    dpi: u32,

    /// Speed/quality trade-off, used when OCR runs
    #[arg(short, long, value_enum, default_value = "balanced")]
    accuracy: AccuracyArg,

    /// Skip images embedded in the source pages (text-based modes)
    #[arg(long)]
    no_images: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Use the text layer when present, recognize otherwise
    Auto,
    /// Only use the existing text layer
    TextOnly,
    /// Always recognize
    Ocr,
    /// Embed each page as an image
    Layout,
}

impl From<ModeArg> for ConversionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Auto => ConversionMode::Auto,
            ModeArg::TextOnly => ConversionMode::TextOnly,
            ModeArg::Ocr => ConversionMode::OcrAlways,
            ModeArg::Layout => ConversionMode::PreserveLayout,
        }
    }
}

pub async fn run(args: WordArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let settings = WordSettings {
        mode: args.mode.into(),
        language: args.lang.clone(),
        dpi: args.dpi,
        accuracy: args.accuracy.into(),
        include_images: !args.no_images,
    };

    let input = args.input.clone();
    let output = args.output.clone();
    let report = run_with_progress(move |progress| {
        WordConverter::new().convert(&input, &output, &settings, progress)
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Converted {} of {} pages into {}{}",
        style("✓").green(),
        report.pages_converted,
        report.total_pages,
        report.output_path.display(),
        if report.used_ocr { " (via OCR)" } else { "" }
    );
    Ok(())
}
