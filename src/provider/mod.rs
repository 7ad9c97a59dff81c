//! Language model and embedding provider capabilities
//!
//! The pipeline only talks to these traits; `openai` holds the HTTP
//! implementation used in production.

pub mod fixed;
pub mod openai;

use crate::error::Result;
use async_trait::async_trait;

pub use fixed::{FixedEmbedder, ScriptedCompletion};
pub use openai::OpenAiClient;

/// Converts text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Model identifier, for logs and health output
    fn model_name(&self) -> &str;
}

/// Produces a JSON completion for a system + user prompt pair
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the raw text of the first choice
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}
