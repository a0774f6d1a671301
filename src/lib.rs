//! # Legal Lens
//!
//! Ask questions about scanned and digital documents.
//!
//! Legal Lens extracts text from PDFs, Word files, plain text and images
//! (falling back to OCR when a page has no text layer), detects the
//! language, indexes one embedding per document in a vector store, and
//! answers questions with retrieval-augmented generation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Extractor  │──▶│ Detect+Index │──▶│ Vector store │
//! │ PDF/DOCX/OCR│   │  (parallel)  │   │ SQLite / mem │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                   ┌──────────────┐   ┌──────▼───────┐
//!   question ──────▶│  Responder   │◀──│  Retriever   │
//!                   │ (generation) │   │   (top-k)    │
//!                   └──────┬───────┘   └──────────────┘
//!                          ▼
//!                 answer + Conversation
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lens init                          # create the vector store
//! lens ingest ./contracts            # index a folder
//! lens ask "Who pays for repairs?"
//! lens serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed errors for each component |
//! | [`extract`] | Format dispatch and text extraction |
//! | [`ocr`] | OCR engine abstraction (tesseract) |
//! | [`convert`] | Legacy `.doc` conversion |
//! | [`language`] | Language detection |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store abstraction (SQLite, in-memory) |
//! | [`index`] | Embedding indexer |
//! | [`retrieve`] | Top-k retriever |
//! | [`generate`] | Text generation, answers, and summaries |
//! | [`conversation`] | Per-conversation state |
//! | [`pipeline`] | End-to-end orchestration |
//! | [`server`] | JSON HTTP API |
//! | [`cli`] | `lens` command implementations |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod cli;
pub mod config;
pub mod conversation;
pub mod convert;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
mod http;
pub mod index;
pub mod language;
pub mod migrate;
pub mod models;
pub mod ocr;
pub mod pipeline;
mod process;
pub mod retrieve;
pub mod server;
pub mod store;
