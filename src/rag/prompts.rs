//! Prompt templates
//!
//! Prompts are pure functions of their inputs. Bump `PROMPT_VERSION` whenever
//! the template text changes.

use crate::facts::Fact;

pub const PROMPT_VERSION: &str = "2";

/// Number of variants the expansion prompt asks for
pub const EXPANSION_TARGET: usize = 10;

pub fn expand_query_prompt(query: &str) -> String {
    format!(
        r#"INSTRUCTIONS

Expand the following QUERY. Provide {EXPANSION_TARGET} additional queries you would use to
diversify your knowledge on the topic.

QUERY

{query}

JSON RESPONSE TEMPLATE

{{
	"queries": ["<query 1>", "<query 2>", "<query 3>"]
}}
"#
    )
}

const ANSWER_INSTRUCTIONS: &str = "Respond to the following QUERY using REFERENCES below. Cite the file in the
REFERENCES that contains the fact used. Provide uncited commentary separately.";

const NO_REFERENCES_NOTICE: &str = "NO REFERENCES are provided, so it is impossible to provide citations.
Answer with commentary only and return an empty \"citations\" array.";

const ANSWER_TEMPLATE: &str = r#"{
	"commentary": "<summary commentary without citations>",
	"citations": [
		{
			"claim": "<summary claim 1>",
			"references": [
				{"excerpt": "<excerpt>", "file": "<file-name-1.txt>"},
				{"excerpt": "<excerpt>", "file": "<file-name-2.txt>"}
			]
		}
	]
}"#;

/// Render the cited-answer prompt for a query and its candidate facts
pub fn answer_prompt(query: &str, facts: &[&Fact]) -> String {
    let references = if facts.is_empty() {
        NO_REFERENCES_NOTICE.to_string()
    } else {
        facts
            .iter()
            .map(|fact| format!("- File: {}\n- Excerpt: {}\n", fact.id, fact.text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "INSTRUCTIONS\n\n{ANSWER_INSTRUCTIONS}\n\nQUERY\n\n{query}\n\nREFERENCES\n\n{references}\n\nJSON RESPONSE TEMPLATE\n\n{ANSWER_TEMPLATE}\n"
    )
}
