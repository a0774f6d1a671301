//! OCR backends.
//!
//! The extractor only needs two capabilities: recognize text in an image
//! file, and recognize text on one page of a PDF (which means rasterizing the
//! page first). [`OcrEngine`] captures exactly that so tests and alternative
//! engines can be swapped in. [`TesseractOcr`] is the default: it shells out
//! to `tesseract` and uses `pdftoppm` (Poppler) for rasterization.
//!
//! Both calls block; the pipeline runs extraction on a blocking worker.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;

use crate::config::OcrConfig;
use crate::error::ExtractError;
use crate::process::run_capture;

/// A text-recognition engine.
pub trait OcrEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Recognize text in an image file.
    fn ocr_image(&self, image: &Path) -> Result<String, ExtractError>;

    /// Rasterize page `page` (1-based) of a PDF and recognize its text.
    fn ocr_pdf_page(&self, pdf: &Path, page: u32) -> Result<String, ExtractError>;
}

/// Tesseract via its CLI, with `pdftoppm` for PDF rasterization.
pub struct TesseractOcr {
    command: String,
    rasterizer: String,
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            rasterizer: config.rasterizer.clone(),
            languages: config.language_profile(),
            dpi: config.dpi(),
        }
    }

    fn run_tesseract(&self, image: &Path) -> Result<String, ExtractError> {
        let start = Instant::now();
        let text = run_capture(
            Command::new(&self.command)
                .arg(image)
                .arg("stdout")
                .args(["-l", &self.languages]),
            &self.command,
            ExtractError::Ocr,
        )?;
        tracing::debug!(
            image = %image.display(),
            chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tesseract finished"
        );
        Ok(text)
    }

    /// Render a single page to `<dir>/page.png`.
    fn rasterize_page(&self, pdf: &Path, page: u32, dir: &Path) -> Result<PathBuf, ExtractError> {
        let page_str = page.to_string();
        let dpi_str = self.dpi.to_string();
        let prefix = dir.join("page");

        run_capture(
            Command::new(&self.rasterizer)
                .args(["-png", "-singlefile", "-r", &dpi_str])
                .args(["-f", &page_str, "-l", &page_str])
                .arg(pdf)
                .arg(&prefix),
            &self.rasterizer,
            ExtractError::Ocr,
        )?;

        let image = prefix.with_extension("png");
        if image.exists() {
            Ok(image)
        } else {
            Err(ExtractError::Ocr(format!(
                "{} produced no image for page {}",
                self.rasterizer, page
            )))
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn ocr_image(&self, image: &Path) -> Result<String, ExtractError> {
        self.run_tesseract(image)
    }

    fn ocr_pdf_page(&self, pdf: &Path, page: u32) -> Result<String, ExtractError> {
        let scratch = TempDir::new()?;
        let image = self.rasterize_page(pdf, page, scratch.path())?;
        self.run_tesseract(&image)
    }
}
