//! Compress command.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::pdf::compress::{compress_pdf, format_size, CompressLevel};

/// Arguments for the compress command.
#[derive(Args)]
pub struct CompressArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Compression level
    #[arg(short, long, value_enum, default_value = "medium")]
    level: LevelArg,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LevelArg {
    /// Lossless rewrite only
    Low,
    /// Rewrite plus stream compression
    Medium,
    /// Maximum compression, prunes unused objects
    High,
}

impl From<LevelArg> for CompressLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Low => CompressLevel::Low,
            LevelArg::Medium => CompressLevel::Medium,
            LevelArg::High => CompressLevel::High,
        }
    }
}

pub async fn run(args: CompressArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let report = compress_pdf(&args.input, &args.output, args.level.into())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Compressed {} pages: {} -> {} ({:.1}%)",
        style("✓").green(),
        report.total_pages,
        format_size(report.original_size),
        format_size(report.new_size),
        report.reduction_percentage
    );
    if report.size_reduction <= 0 {
        println!(
            "{} Output is not smaller; the input was already well compressed",
            style("ℹ").blue()
        );
    }
    Ok(())
}
