//! Per-conversation state.
//!
//! A [`Conversation`] is owned by the caller and passed to every pipeline
//! call. Ingesting a new document resets it; asking a question prepends a
//! turn to its history.

use serde::Serialize;

use crate::models::{ActiveDocument, ChatTurn};

pub const DEFAULT_MAX_TURNS: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    id: String,
    /// Newest first.
    history: Vec<ChatTurn>,
    document: Option<ActiveDocument>,
    #[serde(skip)]
    max_turns: usize,
}

impl Conversation {
    pub fn new(max_turns: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            history: Vec::new(),
            document: None,
            max_turns: max_turns.max(1),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Prior turns, newest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn document(&self) -> Option<&ActiveDocument> {
        self.document.as_ref()
    }

    /// Prepend a turn, dropping the oldest ones beyond `max_turns`.
    pub fn record_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.history.insert(
            0,
            ChatTurn {
                question: question.into(),
                answer: answer.into(),
            },
        );
        self.history.truncate(self.max_turns);
    }

    /// Switch to a newly ingested document. History belongs to the previous
    /// document and is discarded.
    pub fn start_document(&mut self, document: ActiveDocument) {
        self.history.clear();
        self.document = Some(document);
    }

    /// Forget the document and history. The id is kept.
    pub fn clear(&mut self) {
        self.history.clear();
        self.document = None;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
