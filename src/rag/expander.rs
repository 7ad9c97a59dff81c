//! Query expansion

use super::{json_body, prompts};
use crate::error::{RagError, Result};
use crate::provider::CompletionClient;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ExpansionResponse {
    queries: Vec<String>,
}

/// Turns one user query into a set of related queries
pub struct QueryExpander {
    client: Arc<dyn CompletionClient>,
    system_prompt: String,
}

impl QueryExpander {
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// Original query first, then the model's variants
    ///
    /// Blank and repeated variants are dropped; the number of variants is
    /// whatever the model returned.
    pub async fn expand(&self, query: &str) -> Result<Vec<String>> {
        let raw = self
            .client
            .complete(&self.system_prompt, &prompts::expand_query_prompt(query))
            .await?;

        let variants = parse_expansion(&raw)?;
        if variants.is_empty() {
            warn!("Query expansion returned no variants");
        }

        let mut seen = HashSet::new();
        let mut queries = Vec::with_capacity(variants.len() + 1);
        for q in std::iter::once(query.to_string()).chain(variants) {
            let q = q.trim().to_string();
            if !q.is_empty() && seen.insert(q.clone()) {
                queries.push(q);
            }
        }

        debug!("Expanded query into {} queries", queries.len());
        Ok(queries)
    }
}

fn parse_expansion(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str::<ExpansionResponse>(json_body(raw))
        .map(|r| r.queries)
        .map_err(|e| RagError::expansion(format!("Invalid expansion response: {}", e), raw))
}
