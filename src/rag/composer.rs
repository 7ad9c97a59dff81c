//! Cited answer composition

use super::models::Answer;
use super::{json_body, prompts};
use crate::error::{RagError, Result};
use crate::facts::Fact;
use crate::provider::CompletionClient;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the grounded prompt and parses the model's cited answer
pub struct AnswerComposer {
    client: Arc<dyn CompletionClient>,
    system_prompt: String,
}

impl AnswerComposer {
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// One completion call; an empty candidate set yields a commentary-only answer
    pub async fn compose(&self, query: &str, facts: &[&Fact]) -> Result<Answer> {
        let prompt = prompts::answer_prompt(query, facts);
        debug!(
            "Composing answer from {} facts (prompt v{})",
            facts.len(),
            prompts::PROMPT_VERSION
        );

        let raw = self.client.complete(&self.system_prompt, &prompt).await?;
        let mut answer = parse_answer(&raw)?;
        debug!(
            "Parsed answer with {} citations and {} references",
            answer.citations.len(),
            answer.reference_count()
        );

        if facts.is_empty() && !answer.citations.is_empty() {
            warn!(
                "Model returned {} citations without references; dropping them",
                answer.citations.len()
            );
            answer.citations.clear();
        }

        Ok(answer)
    }
}

/// Parse `{commentary, citations: [{claim, references: [{excerpt, file}]}]}`
pub fn parse_answer(raw: &str) -> Result<Answer> {
    serde_json::from_str::<Answer>(json_body(raw))
        .map_err(|e| RagError::composition(format!("Invalid answer response: {}", e), raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedCompletion;

    const SKY_ANSWER: &str = r#"{
        "commentary": "Blue light scatters more.",
        "citations": [
            {"claim": "Rayleigh scattering makes the sky blue",
             "references": [{"excerpt": "the sky is blue", "file": "sky.txt"}]}
        ]
    }"#;

    fn sky() -> Fact {
        Fact::new("sky.txt", "the sky is blue due to Rayleigh scattering", vec![1.0])
    }

    #[tokio::test]
    async fn test_compose_parses_citations() {
        let client = Arc::new(ScriptedCompletion::new().respond(SKY_ANSWER));
        let composer = AnswerComposer::new(client.clone(), "system");
        let fact = sky();

        let answer = composer.compose("why is the sky blue?", &[&fact]).await.unwrap();

        assert_eq!(answer.commentary, "Blue light scatters more.");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].references[0].file, "sky.txt");

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- File: sky.txt"));
    }

    #[tokio::test]
    async fn test_compose_without_facts_has_no_citations() {
        let client = Arc::new(ScriptedCompletion::new().respond(SKY_ANSWER));
        let composer = AnswerComposer::new(client.clone(), "system");

        let answer = composer.compose("why is the sky blue?", &[]).await.unwrap();

        assert!(answer.citations.is_empty());
        assert_eq!(answer.commentary, "Blue light scatters more.");
        assert!(client.prompts()[0].contains("impossible to provide citations"));
    }

    #[tokio::test]
    async fn test_compose_missing_commentary() {
        let body = r#"{"citations": []}"#;
        let composer = AnswerComposer::new(Arc::new(ScriptedCompletion::new().respond(body)), "system");
        let fact = sky();

        let err = composer.compose("q", &[&fact]).await.unwrap_err();
        assert!(matches!(err, RagError::Composition { .. }));
        assert_eq!(err.raw_response(), Some(body));
    }

    #[tokio::test]
    async fn test_compose_truncated_json() {
        let body = r#"{"commentary": "Blue light", "citations": [{"claim": "#;
        let composer = AnswerComposer::new(Arc::new(ScriptedCompletion::new().respond(body)), "system");

        let err = composer.compose("q", &[]).await.unwrap_err();
        assert_eq!(err.code(), "COMPOSITION_ERROR");
    }

    #[tokio::test]
    async fn test_compose_reference_without_file() {
        let body = r#"{"commentary": "c", "citations": [{"claim": "x", "references": [{"excerpt": "e"}]}]}"#;
        let composer = AnswerComposer::new(Arc::new(ScriptedCompletion::new().respond(body)), "system");

        assert!(matches!(
            composer.compose("q", &[]).await,
            Err(RagError::Composition { .. })
        ));
    }

    #[tokio::test]
    async fn test_compose_empty_choices_is_completion_error() {
        let composer = AnswerComposer::new(Arc::new(ScriptedCompletion::new()), "system");
        assert!(matches!(
            composer.compose("q", &[]).await,
            Err(RagError::Completion(_))
        ));
    }

    #[test]
    fn test_parse_answer_accepts_fenced_json() {
        let raw = format!("```json\n{}\n```", SKY_ANSWER);
        let answer = parse_answer(&raw).unwrap();
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn test_parse_answer_null_references() {
        let answer = parse_answer(
            r#"{"commentary": "c", "citations": [{"claim": "x", "references": null}]}"#,
        )
        .unwrap();
        assert_eq!(answer.reference_count(), 0);
    }

    #[tokio::test]
    async fn test_compose_null_citations_without_facts() {
        let body = r#"{"commentary": "No references available.", "citations": null}"#;
        let composer = AnswerComposer::new(Arc::new(ScriptedCompletion::new().respond(body)), "system");

        let answer = composer.compose("q", &[]).await.unwrap();
        assert_eq!(answer.commentary, "No references available.");
        assert!(answer.citations.is_empty());
    }
}
