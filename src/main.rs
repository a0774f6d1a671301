//! # Legal Lens CLI (`lens`)
//!
//! The `lens` binary drives the ingestion and retrieval pipeline from the
//! command line and can serve it over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! lens --config ./config/lens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lens init` | Create the SQLite vector store |
//! | `lens extract <path>` | Print the text extracted from a document |
//! | `lens detect <path>` | Print the detected language of a document |
//! | `lens ingest <path>` | Index a document (with summary) or a whole directory |
//! | `lens search "<query>"` | Show the top-k scored matches |
//! | `lens ask "<question>"` | Answer a question from the index |
//! | `lens summarize <path>` | Summarize a document without indexing it |
//! | `lens chat [path]` | Interactive question-and-answer session |
//! | `lens serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Check what OCR makes of a scanned lease
//! lens extract ./docs/lease-scan.pdf --strict
//!
//! # Index a folder of contracts, then query it
//! lens ingest ./contracts
//! lens ask "What is the notice period for termination?"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use legal_lens::{cli, config, server};

/// Legal Lens: ask questions about scanned and digital documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lens.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lens",
    about = "Legal Lens: document ingestion, retrieval, and question answering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/lens.toml`. `extract` and `detect` fall back to
    /// built-in defaults when the file is missing.
    #[arg(long, global = true, default_value = "./config/lens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the vector store.
    ///
    /// Creates the SQLite database file and the `entries` table. Running it
    /// more than once is safe.
    Init,

    /// Extract and print the text of a document.
    Extract {
        path: PathBuf,

        /// Fail with the underlying error instead of printing empty text.
        #[arg(long)]
        strict: bool,
    },

    /// Detect the language of a document or a string.
    Detect {
        path: Option<PathBuf>,

        /// Detect the language of this text instead of a file.
        #[arg(long)]
        text: Option<String>,
    },

    /// Index a document, or every supported file under a directory.
    Ingest { path: PathBuf },

    /// Show scored matches for a query.
    Search {
        query: String,

        /// Maximum number of results (defaults to `[retrieval] top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer a question using the indexed documents.
    Ask {
        question: String,

        /// Ingest this document first.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Summarize a document without indexing it.
    Summarize { path: PathBuf },

    /// Interactive session. Type `:load <path>` to switch documents.
    Chat { file: Option<PathBuf> },

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("legal_lens=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Extract { path, strict } => {
            let cfg =
                config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
            return cli::run_extract(&cfg, path, *strict);
        }
        Commands::Detect { path, text } => {
            let cfg =
                config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
            return cli::run_detect(&cfg, path.as_deref(), text.as_deref());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => cli::run_init(&cfg).await?,
        Commands::Ingest { path } => cli::run_ingest(&cfg, &path).await?,
        Commands::Search { query, limit } => cli::run_search(&cfg, &query, limit).await?,
        Commands::Ask { question, file } => {
            cli::run_ask(&cfg, &question, file.as_deref()).await?
        }
        Commands::Summarize { path } => cli::run_summarize(&cfg, &path).await?,
        Commands::Chat { file } => cli::run_chat(&cfg, file.as_deref()).await?,
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Extract { .. } | Commands::Detect { .. } => {
            // Handled above (before config loading)
        }
    }

    Ok(())
}
