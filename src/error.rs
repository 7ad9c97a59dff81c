//! Error types for the retrieval pipeline

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RagError>;

/// Vector comparison failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimilarityError {
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Cosine similarity is undefined for a zero-magnitude vector")]
    ZeroMagnitude,

    #[error("Cannot compare empty vectors")]
    Empty,
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum RagError {
    /// Loading the fact directory failed; the server cannot start
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Query expansion output did not match `{queries: [string]}`
    #[error("Expansion error: {message}")]
    Expansion { message: String, raw: String },

    /// Answer output did not match the cited answer schema
    #[error("Composition error: {message}")]
    Composition { message: String, raw: String },

    #[error("Similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn expansion(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Expansion {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn composition(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Composition {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Stable machine-readable code for API responses and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ingestion(_) => "INGESTION_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::Completion(_) => "COMPLETION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Expansion { .. } => "EXPANSION_ERROR",
            Self::Composition { .. } => "COMPOSITION_ERROR",
            Self::Similarity(_) => "SIMILARITY_ERROR",
            Self::InvalidQuery(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Raw model output attached to schema failures
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Expansion { raw, .. } | Self::Composition { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the failure came from the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}

impl From<config::ConfigError> for RagError {
    fn from(e: config::ConfigError) -> Self {
        RagError::Config(e.to_string())
    }
}
