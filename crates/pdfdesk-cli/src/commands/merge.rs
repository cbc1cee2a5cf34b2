//! Merge command - combine several PDFs into one.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::pdf::ops::merge_pdfs;

/// Arguments for the merge command.
#[derive(Args)]
pub struct MergeArgs {
    /// Input PDF files, in the order they should appear
    #[arg(required = true, num_args = 2..)]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,
}

pub async fn run(args: MergeArgs) -> anyhow::Result<()> {
    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    let pages = merge_pdfs(&args.inputs, &args.output)?;
    println!(
        "{} Merged {} files ({} pages) into {}",
        style("✓").green(),
        args.inputs.len(),
        pages,
        args.output.display()
    );
    Ok(())
}
