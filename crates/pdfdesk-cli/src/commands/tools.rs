//! Tools command - check the external binaries the OCR commands need.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfdesk_core::ocr::TesseractEngine;
use pdfdesk_core::PopplerRasterizer;

/// Arguments for the tools command.
#[derive(Args)]
pub struct ToolsArgs {
    /// Path to the tesseract binary (default: PATH)
    #[arg(long)]
    tesseract_cmd: Option<PathBuf>,

    /// Path to the pdftoppm binary (default: PATH)
    #[arg(long)]
    pdftoppm_cmd: Option<PathBuf>,
}

pub async fn run(args: ToolsArgs) -> anyhow::Result<()> {
    let engine = match args.tesseract_cmd {
        Some(cmd) => TesseractEngine::with_command(cmd),
        None => TesseractEngine::new(),
    };
    let rasterizer = match args.pdftoppm_cmd {
        Some(cmd) => PopplerRasterizer::with_command(cmd),
        None => PopplerRasterizer::new(),
    };

    let mut all_ok = true;

    match engine.probe() {
        Ok(version) => {
            println!("{} tesseract: {}", style("✓").green(), version);
            match engine.list_languages() {
                Ok(langs) if !langs.is_empty() => {
                    println!("  languages: {}", langs.join(", "));
                }
                Ok(_) => {
                    println!("  {} no language packs installed", style("!").yellow());
                }
                Err(e) => {
                    println!("  {} could not list languages: {}", style("!").yellow(), e);
                }
            }
        }
        Err(e) => {
            all_ok = false;
            println!("{} tesseract: {}", style("✗").red(), e);
        }
    }

    match rasterizer.probe() {
        Ok(version) => println!("{} pdftoppm: {}", style("✓").green(), version),
        Err(e) => {
            all_ok = false;
            println!("{} pdftoppm: {}", style("✗").red(), e);
        }
    }

    if !all_ok {
        println!(
            "\n{} OCR and conversion commands need both tools installed",
            style("ℹ").blue()
        );
        anyhow::bail!("missing external tools");
    }
    Ok(())
}
