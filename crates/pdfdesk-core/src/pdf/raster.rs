//! Page rasterization via Poppler's `pdftoppm`.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tempfile::TempDir;
use tracing::debug;

use crate::error::OcrError;
use crate::exec::tool_command;

/// Lowest supported rasterization resolution.
pub const MIN_DPI: u32 = 72;
/// Highest supported rasterization resolution.
pub const MAX_DPI: u32 = 600;

/// Renders PDF pages to bitmaps at a requested resolution.
pub trait PageRasterizer {
    /// Rasterize every page of `pdf` at `dpi` pixels per inch.
    ///
    /// The returned sequence is ordered, finite, and non-restartable; any
    /// failure aborts the whole sequence.
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<PageImages, OcrError>;
}

/// Rasterizer shelling out to `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    cmd: PathBuf,
}

impl PopplerRasterizer {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self {
            cmd: PathBuf::from("pdftoppm"),
        }
    }

    /// Use an explicit `pdftoppm` binary.
    pub fn with_command(cmd: impl Into<PathBuf>) -> Self {
        Self { cmd: cmd.into() }
    }

    /// Check that the converter is runnable and report its version line.
    pub fn probe(&self) -> Result<String, OcrError> {
        let output = tool_command(&self.cmd)
            .arg("-v")
            .output()
            .map_err(|e| OcrError::EngineMissing(format!("{}: {}", self.cmd.display(), e)))?;

        // pdftoppm prints its version banner on stderr.
        let banner = String::from_utf8_lossy(&output.stderr);
        let line = banner
            .lines()
            .chain(String::from_utf8_lossy(&output.stdout).lines())
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if line.is_empty() {
            return Err(OcrError::EngineMissing(format!(
                "{} produced no version output",
                self.cmd.display()
            )));
        }
        Ok(line)
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<PageImages, OcrError> {
        let dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        let dir = TempDir::new().map_err(|e| OcrError::Rasterize(e.to_string()))?;
        let prefix = dir.path().join("page");

        debug!("rasterizing {} at {} dpi", pdf.display(), dpi);
        let output = tool_command(&self.cmd)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| OcrError::EngineMissing(format!("{}: {}", self.cmd.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Rasterize(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .map_err(|e| OcrError::Rasterize(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().map(|e| e == "png").unwrap_or(false)
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with("page-"))
                        .unwrap_or(false)
            })
            .collect();
        // pdftoppm zero-pads page numbers, so lexicographic order is page order.
        files.sort();

        if files.is_empty() {
            return Err(OcrError::Rasterize(
                "pdftoppm produced no page images".to_string(),
            ));
        }

        debug!("rasterized {} pages", files.len());
        Ok(PageImages {
            _dir: dir,
            files,
            next: 0,
        })
    }
}

/// Ordered sequence of rasterized page bitmaps, decoded lazily.
///
/// Owns the temporary directory the page files live in; dropping the
/// sequence removes them.
pub struct PageImages {
    _dir: TempDir,
    files: Vec<PathBuf>,
    next: usize,
}

impl PageImages {
    /// Build a sequence from already-rendered page files, in page order.
    ///
    /// `dir` is held for the lifetime of the sequence so the files stay on
    /// disk until iteration finishes; alternate [`PageRasterizer`]
    /// implementations construct their results through here.
    pub fn from_files(dir: TempDir, files: Vec<PathBuf>) -> Self {
        Self {
            _dir: dir,
            files,
            next: 0,
        }
    }

    /// Total number of pages in the sequence.
    pub fn page_count(&self) -> usize {
        self.files.len()
    }
}

impl Iterator for PageImages {
    type Item = Result<DynamicImage, OcrError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.next)?.clone();
        self.next += 1;
        Some(
            image::open(&path)
                .map_err(|e| OcrError::Rasterize(format!("{}: {}", path.display(), e))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_reports_engine_missing() {
        let rasterizer = PopplerRasterizer::with_command("/nonexistent/pdftoppm");
        let err = rasterizer.probe().unwrap_err();
        assert!(matches!(err, OcrError::EngineMissing(_)));
    }

    #[test]
    fn page_images_can_wrap_externally_rendered_files() {
        struct FixedRasterizer;

        impl PageRasterizer for FixedRasterizer {
            fn rasterize(&self, _pdf: &Path, _dpi: u32) -> Result<PageImages, OcrError> {
                let dir = TempDir::new().map_err(|e| OcrError::Rasterize(e.to_string()))?;
                let mut files = Vec::new();
                for i in 0..2 {
                    let path = dir.path().join(format!("page-{i}.png"));
                    image::GrayImage::from_pixel(4, 4, image::Luma([255]))
                        .save(&path)
                        .map_err(|e| OcrError::Rasterize(e.to_string()))?;
                    files.push(path);
                }
                Ok(PageImages::from_files(dir, files))
            }
        }

        let pages = FixedRasterizer.rasterize(Path::new("unused.pdf"), 72).unwrap();
        assert_eq!(pages.page_count(), 2);
        let decoded: Vec<_> = pages.collect();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|p| p.is_ok()));
    }

    #[test]
    fn dpi_bounds_cover_print_resolutions() {
        assert_eq!(MIN_DPI, 72);
        assert!(MAX_DPI >= 600);
    }
}
