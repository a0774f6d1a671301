//! Format-aware text extraction with OCR fallback.
//!
//! [`Extractor::extract`] is the entry point the pipeline uses: it dispatches
//! on [`SourceFormat`] and never fails except for an unsupported extension.
//! Every other failure (corrupt file, missing tool, bad encoding) is logged
//! and degrades to empty text. [`Extractor::extract_strict`] runs the same
//! handlers but returns the underlying [`ExtractError`].
//!
//! | Format | Handler |
//! |--------|---------|
//! | PDF | per-page text layer via `pdf-extract`; OCR for empty pages |
//! | DOCX | `word/document.xml` paragraphs via `zip` + `quick-xml` |
//! | DOC | external converter (`catdoc`) |
//! | TXT | UTF-8 read |
//! | Image | OCR |

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::convert::{CommandConverter, DocConverter};
use crate::error::ExtractError;
use crate::models::SourceFormat;
use crate::ocr::{OcrEngine, TesseractOcr};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Dispatches files to the handler for their format.
pub struct Extractor {
    ocr: Arc<dyn OcrEngine>,
    converter: Arc<dyn DocConverter>,
}

impl Extractor {
    pub fn new(ocr: Arc<dyn OcrEngine>, converter: Arc<dyn DocConverter>) -> Self {
        Self { ocr, converter }
    }

    /// Build an extractor backed by tesseract/pdftoppm and the configured converter.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(TesseractOcr::new(&config.ocr)),
            Arc::new(CommandConverter::new(&config.converter)),
        )
    }

    /// Extract text, degrading every failure except an unsupported format to
    /// empty text.
    pub fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let format = resolve_format(path)?;
        match self.extract_format(path, format) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(path = %path.display(), format = %format, error = %e, "extraction failed");
                Ok(String::new())
            }
        }
    }

    /// Extract text, surfacing the first failure.
    pub fn extract_strict(&self, path: &Path) -> Result<String, ExtractError> {
        let format = resolve_format(path)?;
        self.extract_format(path, format)
    }

    fn extract_format(&self, path: &Path, format: SourceFormat) -> Result<String, ExtractError> {
        match format {
            SourceFormat::Pdf => self.extract_pdf(path),
            SourceFormat::Docx => extract_docx(&std::fs::read(path)?),
            SourceFormat::LegacyDoc => self.converter.convert(path),
            SourceFormat::Txt => extract_txt(path),
            SourceFormat::Image => self.ocr.ocr_image(path),
            SourceFormat::Raw => Err(ExtractError::UnsupportedFormat(
                "raw text has no file to extract".to_string(),
            )),
        }
    }

    /// Text layer first; pages whose layer is blank go through OCR.
    fn extract_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let pages = pdf_text_layers(path)?;
        let mut out = String::new();

        for (idx, layer) in pages.iter().enumerate() {
            let page_no = idx as u32 + 1;
            if layer.trim().is_empty() {
                tracing::debug!(
                    path = %path.display(),
                    page = page_no,
                    engine = self.ocr.name(),
                    "no text layer, running OCR"
                );
                let recognized = self.ocr.ocr_pdf_page(path, page_no)?;
                out.push_str(&recognized);
            } else {
                out.push_str(layer);
            }
            out.push('\n');
        }

        Ok(out)
    }
}

/// Map a path to its format, or `UnsupportedFormat(".ext")`.
pub(crate) fn resolve_format(path: &Path) -> Result<SourceFormat, ExtractError> {
    SourceFormat::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| "(none)".to_string());
        ExtractError::UnsupportedFormat(ext)
    })
}

/// One entry per page; `pdf-extract` panics on some malformed files, so the
/// call is isolated.
fn pdf_text_layers(path: &Path) -> Result<Vec<String>, ExtractError> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(ExtractError::Pdf(format!("parser panicked: {}", msg)))
        }
    }
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| ExtractError::Decode {
        path: path.to_path_buf(),
        message: e.utf8_error().to_string(),
    })
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Ooxml("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Ooxml(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    Ok(docx_paragraphs(&doc_xml)?.join("\n"))
}

/// Collect the text of each `<w:p>` in document order. Runs inside a
/// paragraph are concatenated; `<w:tab/>` and `<w:br/>` become a tab and a
/// newline.
fn docx_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                // <w:p/> is an empty paragraph
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
