//! Deterministic stand-ins for the external services.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use legal_lens::convert::DocConverter;
use legal_lens::embedding::Embedder;
use legal_lens::error::ExtractError;
use legal_lens::extract::Extractor;
use legal_lens::generate::TextGenerator;
use legal_lens::language::LanguageDetector;
use legal_lens::ocr::OcrEngine;
use legal_lens::pipeline::{Pipeline, PipelineSettings};
use legal_lens::store::{MemoryStore, VectorStore};

pub const DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase word is hashed into one of `DIMS`
/// buckets and the result is L2-normalized. Texts sharing words score high.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '$')
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let bucket = word
                .bytes()
                .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619))
                as usize
                % DIMS;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }
}

/// Returns its prompt verbatim and remembers every prompt it saw.
#[derive(Default)]
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    pub fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(prompt.to_string())
    }
}

/// OCR engine that returns fixed text and records which pages it was asked for.
pub struct FakeOcr {
    pub text: String,
    pub pdf_pages: Mutex<Vec<u32>>,
    pub images: Mutex<usize>,
}

impl FakeOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            pdf_pages: Mutex::new(Vec::new()),
            images: Mutex::new(0),
        }
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }
    fn ocr_image(&self, _image: &Path) -> Result<String, ExtractError> {
        *self.images.lock().unwrap() += 1;
        Ok(self.text.clone())
    }
    fn ocr_pdf_page(&self, _pdf: &Path, page: u32) -> Result<String, ExtractError> {
        self.pdf_pages.lock().unwrap().push(page);
        Ok(self.text.clone())
    }
}

/// Converter that reads the file as UTF-8, standing in for catdoc.
pub struct ReadConverter;

impl DocConverter for ReadConverter {
    fn convert(&self, path: &Path) -> Result<String, ExtractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

pub fn extractor_with(ocr: Arc<FakeOcr>) -> Extractor {
    Extractor::new(ocr, Arc::new(ReadConverter))
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<EchoGenerator>,
    pub ocr: Arc<FakeOcr>,
}

pub fn harness() -> Harness {
    harness_with(Arc::new(HashEmbedder), PipelineSettings::default())
}

pub fn harness_with(embedder: Arc<dyn Embedder>, settings: PipelineSettings) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(EchoGenerator::default());
    let ocr = Arc::new(FakeOcr::new("Recognized text from a scanned page."));
    let pipeline = Pipeline::new(
        extractor_with(ocr.clone()),
        LanguageDetector::default(),
        embedder,
        store.clone() as Arc<dyn VectorStore>,
        generator.clone(),
        settings,
    );
    Harness {
        pipeline,
        store,
        generator,
        ocr,
    }
}

/// Minimal PDF with one page whose content stream is empty, i.e. no text
/// layer at all.
pub fn blank_page_pdf() -> Vec<u8> {
    pdf_with_pages(&[""])
}

/// Minimal PDF with one page per entry. A non-empty entry is drawn in
/// Helvetica as the page's text layer; an empty entry leaves the page
/// without one. Stream lengths and xref offsets are computed as the body is
/// built.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            id + 1
        ));
        let content = if page.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", page)
        };
        objects.push(format!(
            "<< /Length {} >> stream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj {} endobj\n", i + 1, body).as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!("trailer << /Size {} /Root 1 0 R >>\nstartxref\n", objects.len() + 1).as_bytes(),
    );
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Minimal DOCX whose body has one `<w:p>` per entry in `paragraphs`.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}
