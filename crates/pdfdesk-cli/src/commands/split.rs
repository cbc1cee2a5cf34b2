//! Split command - extract a page range or burst into single pages.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::pdf::ops::{split_into_pages, split_range};

use crate::pages::parse_range;

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Page range to keep, e.g. 2-5
    #[arg(short, long, conflicts_with = "all")]
    range: Option<String>,

    /// Output PDF file (with --range)
    #[arg(short, long, required_unless_present = "all")]
    output: Option<PathBuf>,

    /// Split every page into its own file
    #[arg(long)]
    all: bool,

    /// Output directory (with --all)
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

pub async fn run(args: SplitArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    if args.all {
        let files = split_into_pages(&args.input, &args.out_dir)?;
        println!(
            "{} Split {} into {} files in {}",
            style("✓").green(),
            args.input.display(),
            files.len(),
            args.out_dir.display()
        );
        return Ok(());
    }

    let range = args
        .range
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("either --range or --all is required"))?;
    let (start, end) = parse_range(range)?;
    let output = args
        .output
        .ok_or_else(|| anyhow::anyhow!("--output is required with --range"))?;

    let pages = split_range(&args.input, &output, start, end)?;
    println!(
        "{} Wrote pages {}-{} ({} pages) to {}",
        style("✓").green(),
        start,
        end,
        pages,
        output.display()
    );
    Ok(())
}
