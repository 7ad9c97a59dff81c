//! Application configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `STUDY__SECTION__KEY` environment variables, then the provider's own
//! conventional variables (`OPENAI_API_KEY` and friends).

use crate::error::{RagError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Page title for the HTML front end
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_title() -> String { "Study".to_string() }
fn default_max_body_bytes() -> usize { 64 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            title: default_title(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Language model / embedding provider configuration
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (read from env OPENAI_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_language_model")]
    pub language_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Bound on every provider call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_language_model() -> String { "gpt-4o".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-large".to_string() }
fn default_system_prompt() -> String { "You are a helpful assistant.".to_string() }
fn default_timeout_ms() -> u64 { 60_000 }

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            language_model: default_language_model(),
            embedding_model: default_embedding_model(),
            system_prompt: default_system_prompt(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// What the retriever does when one expanded query cannot be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Fail the whole retrieval round
    #[default]
    Abort,
    /// Log and continue with the remaining queries
    SkipQuery,
}

/// Retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Directory of plain-text fact files
    #[serde(default = "default_facts_dir")]
    pub facts_dir: PathBuf,

    /// Facts must score strictly above this cosine similarity
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default)]
    pub embedding_failure_policy: EmbeddingFailurePolicy,

    #[serde(default = "default_max_concurrent_embeddings")]
    pub max_concurrent_embeddings: usize,
}

fn default_facts_dir() -> PathBuf { PathBuf::from("references") }
fn default_similarity_threshold() -> f64 { 0.5 }
fn default_max_concurrent_embeddings() -> usize { 4 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            facts_dir: default_facts_dir(),
            similarity_threshold: default_similarity_threshold(),
            embedding_failure_policy: EmbeddingFailurePolicy::default(),
            max_concurrent_embeddings: default_max_concurrent_embeddings(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load from an optional TOML file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STUDY")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        let config = config.from_env();
        config.validate()?;

        Ok(config)
    }

    /// Apply the provider's conventional environment variables
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.provider.api_key = Some(SecretString::new(val));
        }

        if let Ok(val) = std::env::var("OPENAI_LANGUAGE_MODEL") {
            self.provider.language_model = val;
        }

        if let Ok(val) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            self.provider.embedding_model = val;
        }

        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.provider.base_url = val;
        }

        self
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.is_none() {
            return Err(RagError::Config(
                "required environment variable not set: OPENAI_API_KEY".to_string(),
            ));
        }

        if !self.retrieval.similarity_threshold.is_finite() {
            return Err(RagError::Config(
                "similarity_threshold must be a finite number".to_string(),
            ));
        }

        if self.retrieval.max_concurrent_embeddings == 0 {
            return Err(RagError::Config(
                "max_concurrent_embeddings must be at least 1".to_string(),
            ));
        }

        if self.provider.timeout_ms == 0 {
            return Err(RagError::Config("timeout_ms must be positive".to_string()));
        }

        if self.provider.language_model.is_empty() || self.provider.embedding_model.is_empty() {
            return Err(RagError::Config("model names cannot be empty".to_string()));
        }

        Ok(())
    }
}
