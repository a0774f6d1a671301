//! TOML configuration.
//!
//! Every section is optional and falls back to defaults, so a missing
//! section never prevents startup. [`load_config`] validates the values that
//! would otherwise fail much later (unknown providers, zero dimensions, an
//! upscaling factor below 2x).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Defaults for every section. Used by commands that can run without a
    /// config file (`lens extract`, `lens detect`).
    pub fn minimal() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

fn default_store_backend() -> String {
    "sqlite".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./data/lens.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_embedding_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    /// Base URL for HTTP providers. Defaults per provider.
    #[serde(default)]
    pub url: Option<String>,
    /// Program for the `command` provider.
    #[serde(default = "default_generation_command")]
    pub command: String,
    /// Arguments for the `command` provider. The prompt is written to stdin.
    #[serde(default = "default_generation_args")]
    pub args: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_summary_style")]
    pub summary_style: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            command: default_generation_command(),
            args: default_generation_args(),
            temperature: default_temperature(),
            summary_style: default_summary_style(),
            max_retries: default_max_retries(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "disabled".to_string()
}
fn default_generation_model() -> String {
    "mistral".to_string()
}
fn default_generation_command() -> String {
    "ollama".to_string()
}
fn default_generation_args() -> Vec<String> {
    vec!["run".to_string(), "mistral".to_string()]
}
fn default_temperature() -> f32 {
    0.2
}
fn default_summary_style() -> String {
    "concise".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    180
}

/// The fixed multi-language Tesseract profile: English plus Indian regional
/// scripts and the major international languages.
pub const DEFAULT_OCR_LANGUAGES: &[&str] = &[
    "eng", "mar", "hin", "tam", "tel", "guj", "kan", "ben", "ori", "pan", "fra", "spa", "deu",
    "chi_sim", "jpn", "rus", "ara",
];

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_command")]
    pub command: String,
    #[serde(default = "default_rasterizer")]
    pub rasterizer: String,
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,
    /// Linear upscaling factor applied when rasterizing PDF pages (72 dpi base).
    #[serde(default = "default_ocr_scale")]
    pub scale: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
            rasterizer: default_rasterizer(),
            languages: default_ocr_languages(),
            scale: default_ocr_scale(),
        }
    }
}

impl OcrConfig {
    /// Tesseract `-l` argument, e.g. `eng+mar+hin`.
    pub fn language_profile(&self) -> String {
        self.languages.join("+")
    }

    /// Rasterization resolution in dots per inch.
    pub fn dpi(&self) -> u32 {
        72 * self.scale
    }
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}
fn default_rasterizer() -> String {
    "pdftoppm".to_string()
}
fn default_ocr_languages() -> Vec<String> {
    DEFAULT_OCR_LANGUAGES.iter().map(|l| l.to_string()).collect()
}
fn default_ocr_scale() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            args: Vec::new(),
        }
    }
}

fn default_converter_command() -> String {
    "catdoc".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LanguageConfig {
    /// Detections below this confidence are reported as `unknown`.
    #[serde(default)]
    pub min_confidence: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.store.backend.as_str() {
        "sqlite" | "memory" => {}
        other => bail!("Unknown store backend: '{}'. Must be sqlite or memory.", other),
    }

    match config.embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
            other
        ),
    }

    match config.generation.provider.as_str() {
        "disabled" | "ollama" | "gemini" | "command" => {}
        other => bail!(
            "Unknown generation provider: '{}'. Must be disabled, ollama, gemini, or command.",
            other
        ),
    }

    match config.generation.summary_style.as_str() {
        "concise" | "plain_language" => {}
        other => bail!(
            "Unknown generation.summary_style: '{}'. Must be concise or plain_language.",
            other
        ),
    }

    if config.ocr.scale < 2 {
        bail!("ocr.scale must be >= 2 (got {})", config.ocr.scale);
    }
    if config.ocr.languages.is_empty() {
        bail!("ocr.languages must not be empty");
    }

    if config.retrieval.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.language.min_confidence) {
        bail!("language.min_confidence must be in [0.0, 1.0]");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.store.backend, "sqlite");
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.ocr.dpi(), 144);
        assert!(cfg.ocr.language_profile().starts_with("eng+mar+hin"));
        assert!(!cfg.embedding.is_enabled());
        assert_eq!(cfg.conversation.max_turns, 50);
    }

    #[test]
    fn remote_embedding_requires_model_and_dims() {
        let err = parse_config("[embedding]\nprovider = \"openai\"\n").unwrap_err();
        assert!(err.to_string().contains("embedding.model"));

        let err = parse_config(
            "[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }

    #[test]
    fn rejects_unknown_providers() {
        assert!(parse_config("[generation]\nprovider = \"gpt\"\n").is_err());
        assert!(parse_config("[store]\nbackend = \"pinecone\"\n").is_err());
    }

    #[test]
    fn rejects_low_ocr_scale() {
        let err = parse_config("[ocr]\nscale = 1\n").unwrap_err();
        assert!(err.to_string().contains("ocr.scale"));
    }

    #[test]
    fn parses_full_generation_section() {
        let cfg = parse_config(
            r#"
[generation]
provider = "command"
command = "ollama"
args = ["run", "llama3"]
summary_style = "plain_language"
"#,
        )
        .unwrap();
        assert_eq!(cfg.generation.args, vec!["run", "llama3"]);
        assert_eq!(cfg.generation.summary_style, "plain_language");
    }
}
