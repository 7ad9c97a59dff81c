//! Citation existence checks

use super::models::{Answer, ReferenceStatus, VerifiedAnswer, VerifiedCitation, VerifiedReference};
use crate::facts::FactIndex;

/// Attach an existence outcome to every reference in `answer`
///
/// Only checks that the cited identifier is in the index; whether the fact
/// supports the claim is not examined. No provider calls.
pub fn verify(answer: Answer, index: &dyn FactIndex) -> VerifiedAnswer {
    let citations = answer
        .citations
        .into_iter()
        .map(|citation| VerifiedCitation {
            claim: citation.claim,
            references: citation
                .references
                .into_iter()
                .map(|reference| {
                    let status = if index.contains(&reference.file) {
                        ReferenceStatus::Exists
                    } else {
                        ReferenceStatus::Missing
                    };
                    VerifiedReference { reference, status }
                })
                .collect(),
        })
        .collect();

    VerifiedAnswer {
        commentary: answer.commentary,
        citations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Fact, FactStore};
    use crate::rag::models::{Citation, Reference};

    fn reference(file: &str) -> Reference {
        Reference {
            excerpt: "paraphrased, not verbatim".to_string(),
            file: file.to_string(),
        }
    }

    #[test]
    fn test_verify_flags_missing_references() {
        let store = FactStore::from_facts(vec![Fact::new("sky.txt", "the sky is blue", vec![1.0])])
            .unwrap();
        let answer = Answer {
            commentary: "unchanged".to_string(),
            citations: vec![
                Citation {
                    claim: "first".to_string(),
                    references: vec![reference("sky.txt"), reference("made-up.txt")],
                },
                Citation {
                    claim: "second".to_string(),
                    references: vec![],
                },
            ],
        };

        let verified = verify(answer.clone(), &store);

        assert_eq!(verified.commentary, "unchanged");
        assert_eq!(verified.citations.len(), 2);
        assert_eq!(verified.citations[0].claim, "first");
        assert_eq!(verified.citations[0].references[0].status, ReferenceStatus::Exists);
        assert_eq!(verified.citations[0].references[1].status, ReferenceStatus::Missing);
        assert_eq!(verified.citations[0].references[1].reference, answer.citations[0].references[1]);
        assert!(verified.citations[1].references.is_empty());
        assert_eq!(verified.missing_references(), vec!["made-up.txt"]);
    }

    #[test]
    fn test_verify_against_empty_store() {
        let store = FactStore::default();
        let answer = Answer {
            commentary: String::new(),
            citations: vec![Citation {
                claim: "c".to_string(),
                references: vec![reference("sky.txt")],
            }],
        };

        let verified = verify(answer, &store);
        assert!(!verified.all_verified());
    }
}
