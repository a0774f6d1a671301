//! End-to-end orchestration.
//!
//! ```text
//! file ──► Extractor ──► text ──┬─► LanguageDetector ─┐
//!                               └─► Indexer ──────────┴─► Responder::summarize ─► Conversation
//!
//! question ──► Retriever ──► passages ──► Responder::answer ──► Conversation (turn prepended)
//! ```
//!
//! The [`Pipeline`] owns one instance of each component, all injected at
//! construction. It holds no per-conversation state; callers pass a
//! [`Conversation`] into each call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::conversation::Conversation;
use crate::embedding::{create_embedder, Embedder};
use crate::error::{AskError, IndexError, IngestError};
use crate::extract::{resolve_format, Extractor};
use crate::generate::{create_generator, Responder, SummaryStyle, TextGenerator};
use crate::index::{IndexOptions, Indexer};
use crate::language::{LanguageDetector, UNKNOWN};
use crate::models::{ActiveDocument, IngestReport, SourceFormat};
use crate::retrieve::Retriever;
use crate::store::{open_store, VectorStore};

/// Tunables that are not components.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub max_turns: usize,
    pub summary_style: SummaryStyle,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_turns: config.conversation.max_turns,
            summary_style: SummaryStyle::from_name(&config.generation.summary_style)
                .unwrap_or(SummaryStyle::Concise),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::minimal())
    }
}

/// Outcome of [`Pipeline::ingest_dir`].
#[derive(Debug, Default, Serialize)]
pub struct DirReport {
    pub ingested: Vec<IngestReport>,
    /// Supported files that could not be ingested, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Files skipped because their extension is not supported.
    pub skipped: usize,
}

pub struct Pipeline {
    extractor: Arc<Extractor>,
    detector: LanguageDetector,
    indexer: Indexer,
    retriever: Retriever,
    responder: Responder,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        extractor: Extractor,
        detector: LanguageDetector,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            detector,
            indexer: Indexer::new(Arc::clone(&embedder), Arc::clone(&store)),
            retriever: Retriever::new(embedder, store),
            responder: Responder::new(generator, settings.summary_style),
            settings,
        }
    }

    /// Wire up every component from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder =
            create_embedder(&config.embedding).context("Failed to create embedding provider")?;
        let generator =
            create_generator(&config.generation).context("Failed to create text generator")?;
        let store = open_store(&config.store).await?;
        if !config.embedding.is_enabled() {
            tracing::warn!("embeddings are disabled; ingested documents will not be retrievable");
        }

        tracing::info!(
            store = %config.store.backend,
            embedding = embedder.model_name(),
            generator = generator.name(),
            "pipeline ready"
        );

        Ok(Self::new(
            Extractor::from_config(config),
            LanguageDetector::new(&config.language),
            embedder,
            store,
            generator,
            PipelineSettings::from_config(config),
        ))
    }

    /// A fresh conversation sized by `[conversation] max_turns`.
    pub fn new_conversation(&self) -> Conversation {
        Conversation::new(self.settings.max_turns)
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn top_k(&self) -> usize {
        self.settings.top_k
    }

    /// Extract, detect, index and summarize a file, then make it the
    /// conversation's active document.
    ///
    /// The document id is the sanitized file name, so re-ingesting the same
    /// file replaces its index entry.
    pub async fn ingest_path(
        &self,
        conversation: &mut Conversation,
        path: &Path,
    ) -> Result<IngestReport, IngestError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let report = self.ingest_file(path, &secure_filename(&name), true).await?;
        conversation.start_document(active_document(&report));
        Ok(report)
    }

    /// Ingest text submitted directly.
    ///
    /// Without a `doc_id` the text is stored under `raw_input:<conversation id>`,
    /// so separate conversations never overwrite each other's raw text.
    pub async fn ingest_text(
        &self,
        conversation: &mut Conversation,
        text: &str,
        doc_id: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        let doc_id = match doc_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => format!("raw_input:{}", conversation.id()),
        };
        let report = self
            .process_text(text.to_string(), doc_id, SourceFormat::Raw, true)
            .await?;
        conversation.start_document(active_document(&report));
        Ok(report)
    }

    /// Answer a question from the top-k passages and the conversation so far.
    ///
    /// Turns belong to the active document: with no document loaded the
    /// question is still answered from the whole index, but nothing is
    /// recorded.
    pub async fn ask(
        &self,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<String, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let passages = self.retriever.retrieve(question, self.settings.top_k).await;
        tracing::debug!(passages = passages.len(), "retrieved context");

        let answer = self
            .responder
            .answer(question, &passages, conversation.history())
            .await;
        if conversation.document().is_some() {
            conversation.record_turn(question, answer.clone());
        } else {
            tracing::debug!("no active document; turn not recorded");
        }
        Ok(answer)
    }

    /// Summarize arbitrary text without touching the index or a conversation.
    pub async fn summarize(&self, text: &str) -> String {
        self.responder.summarize(text).await
    }

    /// Index every supported file under `dir`.
    ///
    /// Each file gets its own throwaway conversation and no summary; only
    /// the index entries are kept. Ids are the sanitized path relative to
    /// `dir`, so equal file names in different folders do not collide.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<DirReport> {
        let mut report = DirReport::default();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if SourceFormat::from_path(path).is_none() {
                report.skipped += 1;
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(path);
            let doc_id = secure_filename(&relative.to_string_lossy());

            match self.ingest_file(path, &doc_id, false).await {
                Ok(ingested) if ingested.indexed => {
                    tracing::info!(doc_id = %ingested.doc_id, chars = ingested.chars, "ingested");
                    report.ingested.push(ingested);
                }
                Ok(ingested) => {
                    report
                        .failed
                        .push((path.to_path_buf(), "indexing failed".to_string()));
                    report.ingested.push(ingested);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping file");
                    report.failed.push((path.to_path_buf(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn ingest_file(
        &self,
        path: &Path,
        doc_id: &str,
        summarize: bool,
    ) -> Result<IngestReport, IngestError> {
        let format = resolve_format(path)?;

        let extractor = Arc::clone(&self.extractor);
        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned_path))
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))??;

        self.process_text(text, doc_id.to_string(), format, summarize)
            .await
    }

    async fn process_text(
        &self,
        text: String,
        doc_id: String,
        format: SourceFormat,
        summarize: bool,
    ) -> Result<IngestReport, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::NoText(doc_id));
        }

        // Detection runs on a blocking worker while the embedding request is
        // in flight; the upsert waits for both so the entry carries the language.
        let detector = self.detector.clone();
        let detect_input = text.clone();
        let detect = tokio::task::spawn_blocking(move || detector.detect(&detect_input));
        let embed = self.indexer.embed(Some(&doc_id), &text);
        let (language, embedded) = tokio::join!(detect, embed);

        let language = language.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "language detection worker failed");
            UNKNOWN.to_string()
        });

        let stored = match embedded {
            Ok(embedded) => {
                self.indexer
                    .commit(
                        embedded,
                        IndexOptions {
                            language: Some(language.clone()),
                            source_format: Some(format),
                        },
                    )
                    .await
            }
            Err(e) => Err(e),
        };
        let indexed = match stored {
            Ok(_) => true,
            Err(e) => {
                log_index_failure(&doc_id, &e);
                false
            }
        };

        let summary = if summarize {
            self.responder.summarize(&text).await
        } else {
            String::new()
        };

        tracing::info!(
            doc_id = %doc_id,
            format = %format,
            language = %language,
            chars = text.chars().count(),
            indexed,
            "document ingested"
        );

        Ok(IngestReport {
            doc_id,
            source_format: format,
            language,
            summary,
            chars: text.chars().count(),
            indexed,
        })
    }
}

fn log_index_failure(doc_id: &str, error: &IndexError) {
    tracing::error!(
        doc_id = %doc_id,
        error = %error,
        "indexing failed; document is available for summary but not retrieval"
    );
}

fn active_document(report: &IngestReport) -> ActiveDocument {
    ActiveDocument {
        doc_id: report.doc_id.clone(),
        language: report.language.clone(),
        summary: report.summary.clone(),
        source_format: report.source_format,
    }
}

/// Reduce a file name to a safe ASCII identifier.
///
/// Path separators become underscores, characters outside
/// `[A-Za-z0-9._-]` are dropped, whitespace runs become a single `_`, and
/// leading/trailing dots and underscores are stripped. An empty result
/// becomes `"document"`.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced
        .split_whitespace()
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
                .collect::<String>()
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let trimmed = joined.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}
