//! Retrieval-augmented answering with citation verification
//!
//! Stages, in order:
//! - `QueryExpander`: one query becomes a set of related queries
//! - `Retriever`: embeds each query and collects matching facts
//! - `AnswerComposer`: asks the model for a cited JSON answer
//! - `verify`: checks every cited identifier against the fact store

pub mod composer;
pub mod expander;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod verifier;

pub use composer::AnswerComposer;
pub use expander::QueryExpander;
pub use models::{
    Answer, Citation, QueryResult, Reference, ReferenceStatus, VerifiedAnswer,
    VerifiedCitation, VerifiedReference,
};
pub use pipeline::{PipelineConfig, RagPipeline};
pub use retriever::Retriever;
pub use verifier::verify;

/// Strip a Markdown code fence some models put around JSON output
pub(crate) fn json_body(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::json_body;

    #[test]
    fn test_json_body() {
        assert_eq!(json_body("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(json_body("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(json_body("```\n{}\n```"), "{}");
    }
}
