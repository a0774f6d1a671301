//! Prompt construction and response post-processing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ChatTurn;

/// How document summaries are phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    /// A short plain-language summary.
    Concise,
    /// A full simplification that lists key details first and answers in
    /// both English and the source language for non-English input.
    PlainLanguage,
}

impl SummaryStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "concise" => Some(Self::Concise),
            "plain_language" => Some(Self::PlainLanguage),
            _ => None,
        }
    }
}

/// Build the retrieval-augmented answer prompt.
///
/// `history` is newest first, as the conversation stores it; the prompt
/// lists turns oldest first so the exchange reads in order.
pub fn answer_prompt(question: &str, passages: &[String], history: &[ChatTurn]) -> String {
    let context = if passages.is_empty() {
        "(no relevant passages found)".to_string()
    } else {
        passages.join("\n\n")
    };

    let mut prompt = String::from(
        "Use the following context and the previous questions and answers to answer the \
         legal question concisely.\n\n",
    );
    prompt.push_str("Context:\n");
    prompt.push_str(&context);
    prompt.push_str("\n\n");

    if !history.is_empty() {
        prompt.push_str("Previous Q&A:\n");
        prompt.push_str(&format_history(history));
        prompt.push('\n');
    }

    prompt.push_str(&format!("Question: {}\n\nAnswer:", question));
    prompt
}

/// Build the whole-document summary prompt.
pub fn summary_prompt(text: &str, style: SummaryStyle) -> String {
    match style {
        SummaryStyle::Concise => format!(
            "Summarize the following legal document in concise, plain language:\n\n{}",
            text
        ),
        SummaryStyle::PlainLanguage => format!(
            "Simplify the following legal text into plain, easy-to-understand language \
             while preserving its original meaning.\n\n\
             If the input text is in English, return the output in English.\n\n\
             If the input text is in another language, return the output in both English \
             and the original language, formatted as follows:\n\n\
             ENGLISH:\n(Simplified English version)\n\n\
             Language of input text:\n(Simplified version in the original language)\n\n\
             Before the summary, but after the language is mentioned, list any key details \
             found in the text, such as names, dates, monetary amounts, or locations.\n\n\
             Now, simplify this legal text:\n\n{}",
            text
        ),
    }
}

fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .rev()
        .map(|turn| format!("Q: {}\nA: {}\n", turn.question, turn.answer))
        .collect()
}

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern should compile"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern should compile"));

/// Normalize generated text for display: `**x**` becomes `<b>x</b>`,
/// HTML line breaks become newlines, and surrounding whitespace is trimmed.
pub fn postprocess(raw: &str) -> String {
    let bolded = BOLD.replace_all(raw, "<b>$1</b>");
    let broken = LINE_BREAK.replace_all(&bolded, "\n");
    broken.trim().to_string()
}
