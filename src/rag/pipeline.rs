//! End-to-end query pipeline

use super::composer::AnswerComposer;
use super::expander::QueryExpander;
use super::models::QueryResult;
use super::retriever::Retriever;
use super::verifier::verify;
use crate::config::{EmbeddingFailurePolicy, RetrievalConfig};
use crate::error::{RagError, Result};
use crate::facts::FactIndex;
use crate::metrics::METRICS;
use crate::provider::{CompletionClient, Embedder};
use crate::time_stage;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Settings the pipeline reads per query
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub similarity_threshold: f64,
    pub embedding_failure_policy: EmbeddingFailurePolicy,
    pub max_concurrent_embeddings: usize,
    pub system_prompt: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let retrieval = RetrievalConfig::default();
        Self {
            similarity_threshold: retrieval.similarity_threshold,
            embedding_failure_policy: retrieval.embedding_failure_policy,
            max_concurrent_embeddings: retrieval.max_concurrent_embeddings,
            system_prompt: "You are a helpful assistant.".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new(retrieval: &RetrievalConfig, system_prompt: impl Into<String>) -> Self {
        Self {
            similarity_threshold: retrieval.similarity_threshold,
            embedding_failure_policy: retrieval.embedding_failure_policy,
            max_concurrent_embeddings: retrieval.max_concurrent_embeddings,
            system_prompt: system_prompt.into(),
        }
    }
}

/// Expand, retrieve, compose and verify one query at a time
///
/// Holds only shared read-only state, so one instance serves concurrent
/// requests.
pub struct RagPipeline {
    facts: Arc<dyn FactIndex>,
    expander: QueryExpander,
    retriever: Retriever,
    composer: AnswerComposer,
    threshold: f64,
}

impl RagPipeline {
    pub fn new(
        facts: Arc<dyn FactIndex>,
        completion: Arc<dyn CompletionClient>,
        embedder: Arc<dyn Embedder>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            facts,
            expander: QueryExpander::new(completion.clone(), config.system_prompt.clone()),
            retriever: Retriever::new(embedder)
                .with_policy(config.embedding_failure_policy)
                .with_max_concurrent(config.max_concurrent_embeddings),
            composer: AnswerComposer::new(completion, config.system_prompt),
            threshold: config.similarity_threshold,
        }
    }

    pub fn facts(&self) -> &dyn FactIndex {
        self.facts.as_ref()
    }

    /// Answer `query`; every failure is returned to the caller
    pub async fn answer(&self, query: &str) -> Result<QueryResult> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("query", request_id = %request_id);

        let result = self.run(&request_id, query).instrument(span).await;

        match &result {
            Ok(_) => METRICS.record_query("success"),
            Err(e) => {
                error!(request_id = %request_id, code = e.code(), "Query failed: {}", e);
                METRICS.record_query(e.code());
            }
        }

        result
    }

    async fn run(&self, request_id: &str, query: &str) -> Result<QueryResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::InvalidQuery("Query cannot be empty".to_string()));
        }

        info!("Answering query: {:?}", query);

        let expanded = time_stage!("expand", self.expander.expand(query).await)?;

        let candidates = time_stage!(
            "retrieve",
            self.retriever
                .retrieve(self.facts.as_ref(), &expanded, self.threshold)
                .await
        )?;
        METRICS.record_retrieval(expanded.len(), candidates.len());
        info!(
            "Retrieved {} facts for {} queries",
            candidates.len(),
            expanded.len()
        );

        let answer = time_stage!("compose", self.composer.compose(query, &candidates).await)?;

        let verified = verify(answer, self.facts.as_ref());
        let missing = verified.missing_references();
        METRICS.record_verification(
            verified.citations.len(),
            verified.verified_count(),
            missing.len(),
        );
        if !missing.is_empty() {
            info!("Answer cites {} unknown facts: {:?}", missing.len(), missing);
        }

        Ok(QueryResult {
            request_id: request_id.to_string(),
            query: query.to_string(),
            expanded_queries: expanded,
            candidate_facts: candidates.iter().map(|f| f.id.clone()).collect(),
            answer: verified,
            answered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Fact, FactStore};
    use crate::provider::{FixedEmbedder, ScriptedCompletion};

    fn pipeline(completion: ScriptedCompletion, embedder: FixedEmbedder) -> RagPipeline {
        let store = FactStore::from_facts(vec![Fact::new(
            "sky.txt",
            "the sky is blue due to Rayleigh scattering",
            vec![1.0, 0.0],
        )])
        .unwrap();

        RagPipeline::new(
            Arc::new(store),
            Arc::new(completion),
            Arc::new(embedder),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let p = pipeline(ScriptedCompletion::new(), FixedEmbedder::new());
        let err = p.answer("   ").await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_expansion_failure_propagates() {
        let p = pipeline(
            ScriptedCompletion::new().respond("{}"),
            FixedEmbedder::new().with_fallback(vec![1.0, 0.0]),
        );
        let err = p.answer("q").await.unwrap_err();
        assert_eq!(err.code(), "EXPANSION_ERROR");
    }

    #[tokio::test]
    async fn test_no_matches_yields_commentary_only() {
        let p = pipeline(
            ScriptedCompletion::new()
                .respond(r#"{"queries": ["unrelated"]}"#)
                .respond(r#"{"commentary": "I have no references.", "citations": []}"#),
            FixedEmbedder::new().with_fallback(vec![0.0, 1.0]),
        );

        let result = p.answer("q").await.unwrap();
        assert!(result.candidate_facts.is_empty());
        assert!(result.answer.citations.is_empty());
        assert_eq!(result.answer.commentary, "I have no references.");
        assert_eq!(result.expanded_queries, vec!["q", "unrelated"]);
    }

    #[tokio::test]
    async fn test_answer_runs_on_spawned_task() {
        let p = Arc::new(pipeline(
            ScriptedCompletion::new()
                .respond(r#"{"queries": ["sky color", "rayleigh"]}"#)
                .respond(r#"{"commentary": "c", "citations": []}"#),
            FixedEmbedder::new().with_fallback(vec![1.0, 0.0]),
        ));

        let task = tokio::spawn({
            let p = p.clone();
            async move { p.answer("why is the sky blue?").await }
        });

        let result = task.await.unwrap().unwrap();
        assert_eq!(result.expanded_queries.len(), 3);
        assert_eq!(result.candidate_facts, vec!["sky.txt"]);
    }
}
