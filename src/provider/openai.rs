//! OpenAI-compatible HTTP client for chat completions and embeddings

use super::{CompletionClient, Embedder};
use crate::config::ProviderConfig;
use crate::error::{RagError, Result};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// OpenAI client implementing both provider capabilities
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    language_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    /// Create a new client; every request is bounded by the configured timeout
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| SecretString::new(key.expose_secret().clone()))
            .ok_or_else(|| RagError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RagError::Internal(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language_model: config.language_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    async fn post<B: Serialize>(
        &self,
        kind: &str,
        path: &str,
        body: &B,
    ) -> std::result::Result<reqwest::Response, CallError> {
        let url = format!("{}{}", self.base_url, path);

        let response = match self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                METRICS.record_provider(kind, false);
                return Err(CallError::from(e));
            }
        };

        if !response.status().is_success() {
            METRICS.record_provider(kind, false);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Provider returned HTTP {} for {}", status, path);
            return Err(CallError::Status(format!("HTTP {}: {}", status, body)));
        }

        METRICS.record_provider(kind, true);
        Ok(response)
    }
}

/// Transport-level failure, mapped onto the caller's error kind
enum CallError {
    Timeout(String),
    Status(String),
    Transport(String),
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CallError::Timeout(e.to_string())
        } else {
            CallError::Transport(e.to_string())
        }
    }
}

impl CallError {
    fn into_rag(self, wrap: fn(String) -> RagError) -> RagError {
        match self {
            CallError::Timeout(msg) => RagError::Timeout(msg),
            CallError::Status(msg) | CallError::Transport(msg) => wrap(msg),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        debug!(
            "Requesting completion: model={}, prompt_chars={}",
            self.language_model,
            user_prompt.len()
        );

        let request = ChatCompletionRequest {
            model: &self.language_model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .post("completion", "/chat/completions", &request)
            .await
            .map_err(|e| e.into_rag(RagError::Completion))?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RagError::Completion(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Completion("No choices in response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.language_model
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self
            .post("embedding", "/embeddings", &request)
            .await
            .map_err(|e| e.into_rag(RagError::Embedding))?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse response: {}", e)))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::Embedding("Empty response from provider".to_string()))?;

        if embedding.is_empty() {
            return Err(RagError::Embedding("Provider returned an empty vector".to_string()));
        }

        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}
