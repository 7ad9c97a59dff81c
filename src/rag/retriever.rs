//! Embedding retrieval across an expanded query set

use crate::config::EmbeddingFailurePolicy;
use crate::error::Result;
use crate::facts::{Fact, FactIndex};
use crate::provider::Embedder;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps queries to a deduplicated set of candidate facts
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    policy: EmbeddingFailurePolicy,
    max_concurrent: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            policy: EmbeddingFailurePolicy::default(),
            max_concurrent: 4,
        }
    }

    pub fn with_policy(mut self, policy: EmbeddingFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Facts scoring above `threshold` for any query, each listed once
    ///
    /// Queries are embedded concurrently but merged in query order, so the
    /// result is in first-seen order. Dimension mismatches always abort.
    pub async fn retrieve<'a>(
        &self,
        index: &'a dyn FactIndex,
        queries: &[String],
        threshold: f64,
    ) -> Result<Vec<&'a Fact>> {
        let pending: Vec<_> = queries.iter().map(|q| self.embedder.embed(q)).collect();
        let embeddings: Vec<Result<Vec<f64>>> = stream::iter(pending)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut last_error = None;
        let mut embedded = 0usize;

        for (query, embedding) in queries.iter().zip(embeddings) {
            let embedding = match embedding {
                Ok(embedding) => embedding,
                Err(e) => match self.policy {
                    EmbeddingFailurePolicy::Abort => return Err(e),
                    EmbeddingFailurePolicy::SkipQuery => {
                        warn!("Skipping query {:?}: {}", query, e);
                        last_error = Some(e);
                        continue;
                    }
                },
            };
            embedded += 1;

            let hits = index.similar(&embedding, threshold)?;
            debug!("Query {:?} matched {} facts", query, hits.len());

            for fact in hits {
                if seen.insert(fact.id.as_str()) {
                    result.push(fact);
                }
            }
        }

        if embedded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::facts::FactStore;
    use crate::provider::FixedEmbedder;

    fn store() -> FactStore {
        FactStore::from_facts(vec![
            Fact::new("sky.txt", "the sky is blue", vec![1.0, 0.0, 0.0]),
            Fact::new("sea.txt", "the sea is salty", vec![0.0, 1.0, 0.0]),
            Fact::new("both.txt", "sky and sea", vec![0.7, 0.7, 0.0]),
        ])
        .unwrap()
    }

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ids<'a>(facts: &[&'a Fact]) -> Vec<&'a str> {
        facts.iter().map(|f| f.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_retrieve_deduplicates_in_first_seen_order() {
        let embedder = FixedEmbedder::new()
            .with("sea", vec![0.0, 1.0, 0.0])
            .with("sky", vec![1.0, 0.0, 0.0])
            .with("sky again", vec![0.9, 0.1, 0.0]);
        let retriever = Retriever::new(Arc::new(embedder));
        let store = store();

        let facts = retriever
            .retrieve(&store, &queries(&["sea", "sky", "sky again"]), 0.5)
            .await
            .unwrap();

        assert_eq!(ids(&facts), vec!["sea.txt", "both.txt", "sky.txt"]);
    }

    #[tokio::test]
    async fn test_retrieve_threshold_above_one_is_empty() {
        let embedder = FixedEmbedder::new().with_fallback(vec![1.0, 0.0, 0.0]);
        let retriever = Retriever::new(Arc::new(embedder));
        let store = store();

        let facts = retriever
            .retrieve(&store, &queries(&["a", "b"]), 1.1)
            .await
            .unwrap();
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_empty_query_set() {
        let embedder = Arc::new(FixedEmbedder::new());
        let retriever = Retriever::new(embedder.clone());
        let store = store();

        let facts = retriever.retrieve(&store, &[], 0.5).await.unwrap();
        assert!(facts.is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_round() {
        let embedder = FixedEmbedder::new()
            .with_fallback(vec![1.0, 0.0, 0.0])
            .failing_on("bad");
        let retriever = Retriever::new(Arc::new(embedder)).with_policy(EmbeddingFailurePolicy::Abort);
        let store = store();

        let result = retriever
            .retrieve(&store, &queries(&["good", "bad"]), 0.5)
            .await;
        assert!(matches!(result, Err(RagError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_skip_policy_continues() {
        let embedder = FixedEmbedder::new()
            .with("sea", vec![0.0, 1.0, 0.0])
            .failing_on("bad");
        let retriever =
            Retriever::new(Arc::new(embedder)).with_policy(EmbeddingFailurePolicy::SkipQuery);
        let store = store();

        let facts = retriever
            .retrieve(&store, &queries(&["bad", "sea"]), 0.5)
            .await
            .unwrap();
        assert_eq!(ids(&facts), vec!["sea.txt", "both.txt"]);
    }

    #[tokio::test]
    async fn test_skip_policy_fails_when_every_query_fails() {
        let embedder = FixedEmbedder::new().failing_on("a").failing_on("b");
        let retriever =
            Retriever::new(Arc::new(embedder)).with_policy(EmbeddingFailurePolicy::SkipQuery);
        let store = store();

        let result = retriever.retrieve(&store, &queries(&["a", "b"]), 0.5).await;
        assert!(matches!(result, Err(RagError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts() {
        let embedder = FixedEmbedder::new().with_fallback(vec![1.0, 0.0]);
        let retriever =
            Retriever::new(Arc::new(embedder)).with_policy(EmbeddingFailurePolicy::SkipQuery);
        let store = store();

        let result = retriever.retrieve(&store, &queries(&["a"]), 0.5).await;
        assert!(matches!(result, Err(RagError::Similarity(_))));
    }
}
