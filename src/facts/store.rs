//! In-memory fact store with linear-scan similarity search

use super::models::Fact;
use super::similarity::{cosine_similarity, l2_norm};
use super::FactIndex;
use crate::error::{RagError, Result};
use crate::provider::Embedder;
use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, info};

/// Facts keyed by identifier, kept in load order
#[derive(Debug, Default)]
pub struct FactStore {
    facts: IndexMap<String, Fact>,
    dimensions: Option<usize>,
}

impl FactStore {
    /// Build a store from already-embedded facts
    ///
    /// Rejects duplicate identifiers, empty or zero-magnitude embeddings and
    /// embeddings whose dimensionality differs from the first fact's.
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Result<Self> {
        let mut store = Self::default();
        for fact in facts {
            store.insert(fact)?;
        }
        Ok(store)
    }

    fn insert(&mut self, fact: Fact) -> Result<()> {
        if self.facts.contains_key(&fact.id) {
            return Err(RagError::Ingestion(format!(
                "Duplicate fact identifier: {}",
                fact.id
            )));
        }

        if fact.embedding.is_empty() || l2_norm(&fact.embedding) == 0.0 {
            return Err(RagError::Ingestion(format!(
                "Fact {} has a zero-magnitude embedding",
                fact.id
            )));
        }

        match self.dimensions {
            Some(dims) if dims != fact.dimensions() => {
                return Err(RagError::Ingestion(format!(
                    "Fact {} has {} dimensions, expected {}",
                    fact.id,
                    fact.dimensions(),
                    dims
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(fact.dimensions()),
        }

        self.facts.insert(fact.id.clone(), fact);
        Ok(())
    }

    /// Load every regular file in `dir` as one fact
    ///
    /// Sub-directories are skipped. Files are read in name order so the store
    /// order is reproducible. Any read or embedding failure aborts the load.
    pub async fn load(dir: impl AsRef<Path>, embedder: &dyn Embedder) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Loading facts from {}", dir.display());

        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            RagError::Ingestion(format!("Failed to read directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RagError::Ingestion(format!("Failed to list {}: {}", dir.display(), e)))?
        {
            let file_type = entry.file_type().await.map_err(|e| {
                RagError::Ingestion(format!("Failed to stat {}: {}", entry.path().display(), e))
            })?;

            if file_type.is_dir() {
                debug!("Skipping sub-directory {}", entry.path().display());
                continue;
            }

            let name = entry.file_name().into_string().map_err(|name| {
                RagError::Ingestion(format!("File name is not valid UTF-8: {:?}", name))
            })?;
            files.push((name, entry.path()));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut store = Self::default();
        for (name, path) in files {
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                RagError::Ingestion(format!("Failed to read file {}: {}", name, e))
            })?;

            let embedding = embedder.embed(&text).await?;
            debug!("Embedded {}: {} dimensions", name, embedding.len());

            store.insert(Fact::new(name, text, embedding))?;
        }

        info!(
            "Loaded {} facts ({} dimensions)",
            store.len(),
            store.dimensions.unwrap_or(0)
        );

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Embedding dimensionality shared by every fact
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }
}

impl FactIndex for FactStore {
    fn similar(&self, query_embedding: &[f64], threshold: f64) -> Result<Vec<&Fact>> {
        let mut result = Vec::new();
        for fact in self.facts.values() {
            let score = cosine_similarity(query_embedding, &fact.embedding)?;
            if score > threshold {
                debug!("Fact {} matched with similarity {:.4}", fact.id, score);
                result.push(fact);
            }
        }
        Ok(result)
    }

    fn get(&self, id: &str) -> Option<&Fact> {
        self.facts.get(id)
    }

    fn len(&self) -> usize {
        self.facts.len()
    }
}
