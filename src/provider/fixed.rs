//! Deterministic providers that never touch the network
//!
//! Used by the test suites and for running the pipeline offline.

use super::{CompletionClient, Embedder};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embedder backed by a lookup table of text -> vector
#[derive(Debug, Default)]
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    fallback: Option<Vec<f64>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: impl Into<String>, vector: Vec<f64>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Vector returned for texts without an explicit entry
    pub fn with_fallback(mut self, vector: Vec<f64>) -> Self {
        self.fallback = Some(vector);
        self
    }

    /// Make `embed` fail for this exact text
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(RagError::Embedding(format!("HTTP 500: refused to embed {:?}", text)));
        }

        self.vectors
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| RagError::Embedding(format!("No vector configured for {:?}", text)))
    }

    fn model_name(&self) -> &str {
        "fixed-embedder"
    }
}

/// Completion client that replays queued responses in order
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: impl Into<String>) -> Self {
        self.push(Ok(body.into()));
        self
    }

    pub fn fail(self, error: RagError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(item);
        }
    }

    /// User prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| RagError::Internal("prompt log poisoned".to_string()))?
            .push(user_prompt.to_string());

        self.responses
            .lock()
            .map_err(|_| RagError::Internal("response queue poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(RagError::Completion("No choices in response".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted-completion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_embedder_lookup_and_fallback() {
        let embedder = FixedEmbedder::new()
            .with("a", vec![1.0, 0.0])
            .with_fallback(vec![0.0, 1.0])
            .failing_on("boom");

        assert_eq!(embedder.embed("a").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(embedder.embed("other").await.unwrap(), vec![0.0, 1.0]);
        assert!(matches!(embedder.embed("boom").await, Err(RagError::Embedding(_))));
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_completion_replays_in_order() {
        let client = ScriptedCompletion::new().respond("first").respond("second");

        assert_eq!(client.complete("s", "p1").await.unwrap(), "first");
        assert_eq!(client.complete("s", "p2").await.unwrap(), "second");
        assert!(matches!(
            client.complete("s", "p3").await,
            Err(RagError::Completion(_))
        ));
        assert_eq!(client.prompts(), vec!["p1", "p2", "p3"]);
    }
}
