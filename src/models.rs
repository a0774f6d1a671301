//! Core data models used throughout Legal Lens.
//!
//! These types represent the documents, index entries, search matches, and
//! chat turns that flow through the ingestion and retrieval pipeline.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Document formats the extractor understands.
///
/// Dispatch is by file extension only, case-insensitive. Every variant has
/// exactly one handler in [`crate::extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Pdf,
    Docx,
    LegacyDoc,
    Txt,
    Image,
    /// Text submitted directly rather than uploaded as a file.
    Raw,
}

impl SourceFormat {
    /// Resolve the format from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::LegacyDoc),
            "txt" => Some(Self::Txt),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => Some(Self::Image),
            _ => None,
        }
    }

    /// Resolve the format of a file path. Raw text has no path, so it is never
    /// returned here.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::LegacyDoc => "legacy-doc",
            Self::Txt => "txt",
            Self::Image => "image",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// The full indexed text; this is what retrieval hands back as a passage.
    pub text: String,
    /// Embedding model that produced the vector.
    pub model: String,
    /// SHA-256 of `text`, hex encoded.
    pub content_hash: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub source_format: Option<SourceFormat>,
    /// Unix timestamp (seconds) of the last upsert.
    pub indexed_at: i64,
}

/// One record in the vector store. `id` is the upsert key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: EntryMetadata,
}

/// A ranked result from a vector store query.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: String,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
    pub metadata: EntryMetadata,
}

/// A question and the answer it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// The document a conversation is currently about.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveDocument {
    pub doc_id: String,
    pub language: String,
    pub summary: String,
    pub source_format: SourceFormat,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub source_format: SourceFormat,
    pub language: String,
    pub summary: String,
    /// Number of characters of extracted text.
    pub chars: usize,
    /// `false` when embedding or the vector store failed; the document can
    /// still be discussed but will not be found by retrieval.
    pub indexed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(SourceFormat::from_extension("PDF"), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_extension("Docx"), Some(SourceFormat::Docx));
        assert_eq!(SourceFormat::from_extension("doc"), Some(SourceFormat::LegacyDoc));
        assert_eq!(SourceFormat::from_extension("JPeG"), Some(SourceFormat::Image));
        assert_eq!(SourceFormat::from_extension("xlsx"), None);
    }

    #[test]
    fn from_path_requires_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("/tmp/lease.TXT")),
            Some(SourceFormat::Txt)
        );
        assert_eq!(SourceFormat::from_path(Path::new("/tmp/README")), None);
    }

    #[test]
    fn format_serializes_kebab_case() {
        let json = serde_json::to_string(&SourceFormat::LegacyDoc).unwrap();
        assert_eq!(json, "\"legacy-doc\"");
    }
}
