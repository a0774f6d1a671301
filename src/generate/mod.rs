//! Text generation: backends, answers, and summaries.
//!
//! A [`TextGenerator`] turns a prompt into text. The [`Responder`] builds
//! prompts from retrieved passages or whole documents, calls the generator,
//! and post-processes the output. Generation failures never propagate: they
//! come back as an `Error: <cause>` string so a conversation stays usable.
//!
//! | Config Value | Backend |
//! |-------------|---------|
//! | `"disabled"` | [`DisabledGenerator`] |
//! | `"ollama"` | [`OllamaGenerator`] (`POST /api/generate`) |
//! | `"gemini"` | [`GeminiGenerator`] (`generateContent`, `GEMINI_API_KEY`) |
//! | `"command"` | [`CommandGenerator`] (prompt on stdin, output on stdout) |

pub mod prompt;

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::config::GenerationConfig;
use crate::http::send_json_with_retry;
use crate::models::ChatTurn;

pub use prompt::{answer_prompt, postprocess, summary_prompt, SummaryStyle};

/// A generative text service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============ Disabled ============

pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("generation is disabled; set [generation] provider in config")
    }
}

// ============ Ollama ============

pub struct OllamaGenerator {
    model: String,
    url: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            temperature: config.temperature,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        let endpoint = format!("{}/api/generate", self.url.trim_end_matches('/'));
        let json = send_json_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&body)
        })
        .await
        .map_err(|e| anyhow!("{} (is Ollama running at {}?)", e, self.url))?;

        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid Ollama response: missing response field"))
    }
}

// ============ Gemini ============

pub struct GeminiGenerator {
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiGenerator {
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is not in the environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1".to_string()),
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let json = send_json_with_retry("Gemini", self.max_retries, || {
            self.client
                .post(&endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
        })
        .await?;

        parse_gemini_response(&json)
    }
}

/// Text of the first part of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Unexpected response format from Gemini"))
}

// ============ Command ============

/// Runs a local program with the prompt on stdin and reads the answer from
/// stdout. The default is `ollama run mistral`.
pub struct CommandGenerator {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    fn name(&self) -> &str {
        &self.command
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start '{}'", self.command))?;

        // Feed stdin from a separate task so a chatty program cannot fill
        // its stdout pipe while we are still writing. Dropping stdin closes
        // the pipe so the program sees EOF.
        let stdin = child.stdin.take();
        let input = prompt.to_string();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::debug!(error = %e, "generator closed stdin early");
                }
            }
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow!(
                    "'{}' timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                )
            })??;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Create the [`TextGenerator`] selected by `[generation] provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiGenerator::new(config)?)),
        "command" => Ok(Arc::new(CommandGenerator::new(config))),
        other => bail!("Unknown generation provider: {}", other),
    }
}

/// Produces answers and summaries from a [`TextGenerator`].
pub struct Responder {
    generator: Arc<dyn TextGenerator>,
    style: SummaryStyle,
}

impl Responder {
    pub fn new(generator: Arc<dyn TextGenerator>, style: SummaryStyle) -> Self {
        Self { generator, style }
    }

    /// Answer `question` from the retrieved `passages` and prior `history`
    /// (newest first).
    pub async fn answer(&self, question: &str, passages: &[String], history: &[ChatTurn]) -> String {
        let prompt = answer_prompt(question, passages, history);
        self.run(&prompt, "answer").await
    }

    /// Summarize a whole document.
    pub async fn summarize(&self, text: &str) -> String {
        let prompt = summary_prompt(text, self.style);
        self.run(&prompt, "summary").await
    }

    async fn run(&self, prompt: &str, kind: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(raw) => postprocess(&raw),
            Err(e) => {
                tracing::error!(
                    generator = self.generator.name(),
                    kind,
                    error = %format!("{:#}", e),
                    "generation failed"
                );
                format!("Error: {:#}", e)
            }
        }
    }
}
