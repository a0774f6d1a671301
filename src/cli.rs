//! Command implementations for the `lens` binary.
//!
//! Each `run_*` function backs one subcommand and prints to stdout; logs go
//! to stderr.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::extract::Extractor;
use crate::language::LanguageDetector;
use crate::migrate;
use crate::pipeline::Pipeline;

pub async fn run_init(config: &Config) -> Result<()> {
    match config.store.backend.as_str() {
        "sqlite" => {
            migrate::run_migrations(&config.store).await?;
            println!(
                "Vector store initialized at {}.",
                config.store.path.display()
            );
        }
        _ => println!("Store backend '{}' needs no initialization.", config.store.backend),
    }
    Ok(())
}

pub fn run_extract(config: &Config, path: &Path, strict: bool) -> Result<()> {
    let extractor = Extractor::from_config(config);
    let text = if strict {
        extractor.extract_strict(path)?
    } else {
        extractor.extract(path)?
    };
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Detect the language of a file's text or of a literal string.
pub fn run_detect(config: &Config, path: Option<&Path>, text: Option<&str>) -> Result<()> {
    let input = match (path, text) {
        (Some(path), None) => Extractor::from_config(config).extract(path)?,
        (None, Some(text)) => text.to_string(),
        _ => bail!("provide exactly one of <PATH> or --text"),
    };
    println!("{}", LanguageDetector::new(&config.language).detect(&input));
    Ok(())
}

/// Ingest a single file (printing its summary) or every supported file in a
/// directory.
pub async fn run_ingest(config: &Config, path: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;

    if path.is_dir() {
        let report = pipeline.ingest_dir(path).await?;
        for doc in &report.ingested {
            println!(
                "{:<40} {:<10} {:<8} {} chars",
                doc.doc_id, doc.source_format, doc.language, doc.chars
            );
        }
        for (failed, reason) in &report.failed {
            println!("FAILED {}: {}", failed.display(), reason);
        }
        println!(
            "\n{} ingested, {} failed, {} skipped (unsupported).",
            report.ingested.len(),
            report.failed.len(),
            report.skipped
        );
        return Ok(());
    }

    let mut conversation = pipeline.new_conversation();
    let report = pipeline.ingest_path(&mut conversation, path).await?;
    println!("Document:  {}", report.doc_id);
    println!("Format:    {}", report.source_format);
    println!("Language:  {}", report.language);
    println!("Chars:     {}", report.chars);
    println!("Indexed:   {}", if report.indexed { "yes" } else { "no" });
    println!("\n{}", report.summary);
    Ok(())
}

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let limit = limit.unwrap_or(pipeline.top_k());
    let matches = pipeline.retriever().search(query, limit).await?;

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} ({})",
            i + 1,
            m.score,
            m.id,
            m.metadata.language.as_deref().unwrap_or("unknown")
        );
        println!("    {}", snippet(&m.metadata.text, 200));
    }
    Ok(())
}

/// Answer one question, optionally ingesting `file` first.
pub async fn run_ask(config: &Config, question: &str, file: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let mut conversation = pipeline.new_conversation();
    if let Some(file) = file {
        pipeline.ingest_path(&mut conversation, file).await?;
    }
    let answer = pipeline.ask(&mut conversation, question).await?;
    println!("{}", answer);
    Ok(())
}

/// Summarize a file without indexing it.
pub async fn run_summarize(config: &Config, path: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let text = Extractor::from_config(config).extract(path)?;
    if text.trim().is_empty() {
        bail!("no text could be extracted from {}", path.display());
    }
    println!("{}", pipeline.summarize(&text).await);
    Ok(())
}

/// Interactive session over stdin.
///
/// Lines are questions, except `:load <path>` (ingest a document and show
/// its summary), `:history`, `:reset`, and `:quit`.
pub async fn run_chat(config: &Config, file: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let mut conversation = pipeline.new_conversation();

    if let Some(file) = file {
        let report = pipeline.ingest_path(&mut conversation, file).await?;
        println!("{}\n", report.summary);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == ":q" {
            break;
        }
        if line == ":reset" {
            conversation.clear();
            println!("Conversation cleared.");
            continue;
        }
        if line == ":history" {
            for turn in conversation.history() {
                println!("Q: {}\nA: {}\n", turn.question, turn.answer);
            }
            continue;
        }
        if let Some(path) = line.strip_prefix(":load ") {
            match pipeline
                .ingest_path(&mut conversation, Path::new(path.trim()))
                .await
            {
                Ok(report) => println!("{}\n", report.summary),
                Err(e) => println!("Could not load document: {}", e),
            }
            continue;
        }

        match pipeline.ask(&mut conversation, line).await {
            Ok(answer) => println!("{}\n", answer),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

/// First `max_chars` characters of `text` on one line.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat = crate::language::normalize_whitespace(text);
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_flattens_and_truncates() {
        assert_eq!(snippet("a\n\nb", 10), "a b");
        assert_eq!(snippet("abcdef", 3), "abc...");
    }
}
