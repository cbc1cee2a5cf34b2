//! Delete and extract commands - page-level edits.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::pdf::ops::{delete_pages, extract_pages};

use crate::pages::parse_page_list;

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Pages to delete, e.g. 2,5-7
    #[arg(short, long)]
    pages: String,
}

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Pages to extract, e.g. 3,1,2
    #[arg(short, long)]
    pages: String,

    /// Keep the pages in the order given instead of document order
    #[arg(long)]
    preserve_order: bool,
}

pub async fn run_delete(args: DeleteArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let pages = parse_page_list(&args.pages)?;
    let remaining = delete_pages(&args.input, &args.output, &pages)?;
    println!(
        "{} Deleted {} pages, {} remain in {}",
        style("✓").green(),
        pages.len(),
        remaining,
        args.output.display()
    );
    Ok(())
}

pub async fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let pages = parse_page_list(&args.pages)?;
    let extracted = extract_pages(&args.input, &args.output, &pages, args.preserve_order)?;
    println!(
        "{} Extracted {} pages into {}",
        style("✓").green(),
        extracted,
        args.output.display()
    );
    Ok(())
}
