//! Data models for the fact store

use serde::{Deserialize, Serialize};

/// One unit of reference text, loaded from a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// File name; unique within a store
    pub id: String,
    pub text: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub embedding: Vec<f64>,
}

impl Fact {
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_serialization_omits_embedding() {
        let fact = Fact::new("a.txt", "fact A", vec![0.1, 0.2]);
        let json = serde_json::to_value(&fact).unwrap();

        assert_eq!(json["id"], "a.txt");
        assert_eq!(json["text"], "fact A");
        assert!(json.get("embedding").is_none());
        assert_eq!(fact.dimensions(), 2);
    }
}
