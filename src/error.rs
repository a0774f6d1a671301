//! Error taxonomy for the ingestion and retrieval pipeline.
//!
//! Each component boundary has its own error type. Most of them never
//! escape the pipeline: extraction failures degrade to empty text, retrieval
//! failures degrade to an empty passage list, and generation failures
//! become an `Error: ...` answer string. The types still exist so the
//! strict entry points (`extract_strict`, `Retriever::search`) and the CLI
//! can report exactly what went wrong.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a file into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file extension is not one of the supported formats.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("document conversion failed: {0}")]
    Converter(String),

    /// Plain text that is not valid UTF-8.
    #[error("{path} is not valid UTF-8: {message}")]
    Decode { path: PathBuf, message: String },

    /// An external binary (tesseract, pdftoppm, catdoc) is not on PATH.
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to embed and store a document.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("refusing to index empty text for '{0}'")]
    EmptyText(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedding has {actual} dimensions, model '{model}' declares {expected}")]
    Dimensions {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("vector store error: {0}")]
    Store(String),
}

/// Failure to run a similarity search.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),
}

/// Failure to ingest a document into a conversation.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Extraction finished but produced nothing worth indexing.
    #[error("no text could be extracted from '{0}'")]
    NoText(String),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Failure to answer a question.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("question must not be empty")]
    EmptyQuestion,
}
