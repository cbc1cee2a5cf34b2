//! External recognition engine, shelled out per page.

use std::path::{Path, PathBuf};

use image::GrayImage;
use tracing::{debug, warn};

use super::{AccuracyMode, WordBox};
use crate::error::OcrError;
use crate::exec::tool_command;

/// Page segmentation mode: fully automatic layout analysis. Fixed; the
/// rasterized pages are always full pages.
const PSM: &str = "3";

/// Wrapper around the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    cmd: PathBuf,
}

impl TesseractEngine {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            cmd: PathBuf::from("tesseract"),
        }
    }

    /// Use an explicit `tesseract` binary.
    pub fn with_command(cmd: impl Into<PathBuf>) -> Self {
        Self { cmd: cmd.into() }
    }

    /// Check that the engine is runnable and report its version line.
    pub fn probe(&self) -> Result<String, OcrError> {
        let output = tool_command(&self.cmd)
            .arg("--version")
            .output()
            .map_err(|e| OcrError::EngineMissing(format!("{}: {}", self.cmd.display(), e)))?;

        // Older releases print the version banner on stderr.
        let banner = String::from_utf8_lossy(&output.stdout).to_string()
            + &String::from_utf8_lossy(&output.stderr);
        let line = banner.lines().next().unwrap_or("").trim().to_string();
        if line.is_empty() {
            return Err(OcrError::EngineMissing(format!(
                "{} produced no version output",
                self.cmd.display()
            )));
        }
        Ok(line)
    }

    /// Installed language packs, excluding the orientation-detection data.
    pub fn list_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = tool_command(&self.cmd)
            .arg("--list-langs")
            .output()
            .map_err(|e| OcrError::EngineMissing(format!("{}: {}", self.cmd.display(), e)))?;

        let text = String::from_utf8_lossy(&output.stdout).to_string()
            + &String::from_utf8_lossy(&output.stderr);
        let langs = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.contains(' ') && !l.ends_with(':') && *l != "osd")
            .map(str::to_string)
            .collect();
        Ok(langs)
    }

    /// Recognize a page as plain text.
    pub fn recognize_text(
        &self,
        img: &GrayImage,
        language: &str,
        mode: AccuracyMode,
        dpi: u32,
        work_dir: &Path,
    ) -> Result<String, OcrError> {
        let input = self.write_page(img, work_dir)?;
        let output = self.run(&input, language, mode, dpi, &[])?;
        Ok(output)
    }

    /// Recognize a page as positioned words, for the hidden text layer.
    pub fn recognize_words(
        &self,
        img: &GrayImage,
        language: &str,
        mode: AccuracyMode,
        dpi: u32,
        work_dir: &Path,
    ) -> Result<Vec<WordBox>, OcrError> {
        let input = self.write_page(img, work_dir)?;
        let tsv = self.run(&input, language, mode, dpi, &["tsv"])?;
        Ok(parse_tsv(&tsv))
    }

    fn write_page(&self, img: &GrayImage, work_dir: &Path) -> Result<PathBuf, OcrError> {
        let path = work_dir.join("ocr-page.png");
        img.save(&path)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        Ok(path)
    }

    fn run(
        &self,
        input: &Path,
        language: &str,
        mode: AccuracyMode,
        dpi: u32,
        extra: &[&str],
    ) -> Result<String, OcrError> {
        debug!(
            "running {} on {} (lang={}, oem={})",
            self.cmd.display(),
            input.display(),
            language,
            oem_flag(mode)
        );
        let output = tool_command(&self.cmd)
            .arg(input)
            .arg("-") // stdout
            .arg("-l")
            .arg(language)
            .arg("--oem")
            .arg(oem_flag(mode))
            .arg("--psm")
            .arg(PSM)
            .arg("--dpi")
            .arg(dpi.to_string())
            .args(extra)
            .output()
            .map_err(|e| OcrError::EngineMissing(format!("{}: {}", self.cmd.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::EngineFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine selection: the legacy engine is markedly faster, the LSTM engine
/// markedly better on degraded scans.
fn oem_flag(mode: AccuracyMode) -> &'static str {
    match mode {
        AccuracyMode::Fast => "0",
        AccuracyMode::Balanced | AccuracyMode::Accurate => "1",
    }
}

/// Parse tesseract TSV output into word boxes.
///
/// The format carries 12 tab-separated columns; level 5 rows are words.
/// Rows with negative confidence are layout artifacts and dropped.
fn parse_tsv(tsv: &str) -> Vec<WordBox> {
    let mut words = Vec::new();
    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        if cols[0] != "5" {
            continue;
        }
        let parsed = (
            cols[6].parse::<u32>(),
            cols[7].parse::<u32>(),
            cols[8].parse::<u32>(),
            cols[9].parse::<u32>(),
            cols[10].parse::<f32>(),
        );
        let (Ok(x), Ok(y), Ok(width), Ok(height), Ok(confidence)) =
            (parsed.0, parsed.1, parsed.2, parsed.3, parsed.4)
        else {
            warn!("skipping malformed tsv row: {line}");
            continue;
        };
        let text = cols[11].trim();
        if confidence < 0.0 || text.is_empty() {
            continue;
        }
        words.push(WordBox {
            text: text.to_string(),
            x,
            y,
            width,
            height,
            confidence,
        });
    }
    words
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn parse_tsv_keeps_confident_words_only() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t850\t1100\t-1\t\n\
             5\t1\t1\t1\t1\t1\t100\t200\t120\t40\t91.5\thello\n\
             5\t1\t1\t1\t1\t2\t240\t200\t130\t40\t-1\t\n\
             5\t1\t1\t1\t1\t3\t390\t200\t90\t40\t88.0\tworld\n"
        );
        let words = parse_tsv(&tsv);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "hello");
        assert_eq!(words[0].x, 100);
        assert_eq!(words[0].y, 200);
        assert_eq!(words[0].width, 120);
        assert_eq!(words[0].height, 40);
        assert_eq!(words[1].text, "world");
    }

    #[test]
    fn parse_tsv_ignores_blank_and_short_rows() {
        let tsv = format!("{HEADER}\n\n5\t1\t1\n5\t1\t1\t1\t1\t1\t10\t10\t20\t20\t70\t \n");
        assert!(parse_tsv(&tsv).is_empty());
    }

    #[test]
    fn legacy_engine_only_for_fast_mode() {
        assert_eq!(oem_flag(AccuracyMode::Fast), "0");
        assert_eq!(oem_flag(AccuracyMode::Balanced), "1");
        assert_eq!(oem_flag(AccuracyMode::Accurate), "1");
    }

    #[test]
    fn missing_binary_reports_engine_missing() {
        let engine = TesseractEngine::with_command("/nonexistent/tesseract");
        assert!(matches!(engine.probe(), Err(OcrError::EngineMissing(_))));
    }
}
