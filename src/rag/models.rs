//! Answer and citation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A model-produced pointer at a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Not guaranteed to be a verbatim substring of the fact
    #[serde(default, alias = "exerpt")]
    pub excerpt: String,
    /// Fact identifier
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub claim: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub references: Vec<Reference>,
}

/// Parsed model answer, before verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub commentary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub citations: Vec<Citation>,
}

/// Absent and `null` lists both mean empty
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Answer {
    pub fn reference_count(&self) -> usize {
        self.citations.iter().map(|c| c.references.len()).sum()
    }
}

/// Existence check outcome for one reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    Exists,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedReference {
    #[serde(flatten)]
    pub reference: Reference,
    pub status: ReferenceStatus,
}

impl VerifiedReference {
    pub fn exists(&self) -> bool {
        self.status == ReferenceStatus::Exists
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedCitation {
    pub claim: String,
    pub references: Vec<VerifiedReference>,
}

/// Answer with an existence outcome attached to every reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAnswer {
    pub commentary: String,
    pub citations: Vec<VerifiedCitation>,
}

impl VerifiedAnswer {
    fn references(&self) -> impl Iterator<Item = &VerifiedReference> {
        self.citations.iter().flat_map(|c| c.references.iter())
    }

    pub fn all_verified(&self) -> bool {
        self.references().all(VerifiedReference::exists)
    }

    pub fn verified_count(&self) -> usize {
        self.references().filter(|r| r.exists()).count()
    }

    /// Identifiers cited by the model that are not in the store
    pub fn missing_references(&self) -> Vec<&str> {
        self.references()
            .filter(|r| !r.exists())
            .map(|r| r.reference.file.as_str())
            .collect()
    }
}

/// Everything produced for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub request_id: String,
    pub query: String,
    pub expanded_queries: Vec<String>,
    /// Identifiers of the facts given to the model
    pub candidate_facts: Vec<String>,
    pub answer: VerifiedAnswer,
    pub answered_at: DateTime<Utc>,
}
