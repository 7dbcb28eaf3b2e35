//! Error types for the complaint clustering core
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::{DensityError, KMeansError};
use thiserror::Error;

/// Errors raised while turning text into vectors
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error(
        "Failed to initialize embedding model: {0}\nSuggestion: Ensure you have internet connection for first-time model download"
    )]
    ModelInit(String),

    #[error(
        "Unknown embedding model '{0}'\nSuggestion: Use one of ParaphraseMLMiniLML12V2, MultilingualE5Small, MultilingualE5Base, AllMiniLML6V2"
    )]
    UnknownModel(String),

    #[error("Failed to generate embeddings: {0}")]
    Generation(String),

    #[error("Embedding model returned no vectors for {inputs} input texts")]
    EmptyOutput { inputs: usize },

    #[error("Embedding model returned {actual} vectors for {expected} input texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error(
        "Embedding dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding model lock was poisoned, likely due to panic in another thread")]
    MutexPoisoned,
}

/// Errors surfaced by a clustering run
///
/// These always reach the caller; a run that fails never yields partial
/// cluster data.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error("No complaints supplied for clustering")]
    EmptyInput,

    #[error("Need at least {required} complaints for clustering, got {actual}")]
    NotEnoughComplaints { required: usize, actual: usize },

    #[error("Embedding generation failed during clustering: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Centroid clustering failed: {0}")]
    KMeans(#[from] KMeansError),
}

impl ClusteringError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::NotEnoughComplaints { .. } => "NOT_ENOUGH_COMPLAINTS",
            Self::Embedding(_) => "EMBEDDING_FAILURE",
            Self::KMeans(_) => "CLUSTERING_FAILURE",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::EmptyInput | Self::NotEnoughComplaints { .. } => vec![
                "Wait until more complaints have been submitted",
                "Check that the complaint snapshot was fetched correctly",
            ],
            Self::Embedding(EmbeddingError::ModelInit(_)) => vec![
                "Check network access for the first model download",
                "Point embedding.cache_dir at a writable directory",
            ],
            Self::Embedding(_) => vec![
                "Retry the run; the model may have been temporarily unavailable",
                "Make sure every complaint has a non-empty title or description",
            ],
            Self::KMeans(_) => vec![
                "Try again with fewer clusters",
                "Verify that stored embeddings all come from the same model",
            ],
        }
    }
}

/// Internal failures of the topic model path
///
/// Never surfaced: the orchestrator falls back to centroid clustering.
#[derive(Error, Debug)]
pub enum TopicModelError {
    #[error("Topic discovery needs at least {required} documents, got {actual}")]
    TooFewDocuments { required: usize, actual: usize },

    #[error("No topic discovered among {documents} documents")]
    NoTopics { documents: usize },

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Density clustering failed: {0}")]
    Density(#[from] DensityError),
}

/// Failures of similarity search, absorbed into an empty match list
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Similarity query is empty")]
    EmptyQuery,

    #[error("Failed to embed similarity query: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(ClusteringError::EmptyInput.status_code(), "EMPTY_INPUT");
        assert_eq!(
            ClusteringError::from(EmbeddingError::EmptyOutput { inputs: 3 }).status_code(),
            "EMBEDDING_FAILURE"
        );
        assert_eq!(
            ClusteringError::from(KMeansError::EmptyVectorSet).status_code(),
            "CLUSTERING_FAILURE"
        );
    }

    #[test]
    fn test_recovery_suggestions_present() {
        let err = ClusteringError::NotEnoughComplaints {
            required: 3,
            actual: 1,
        };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.to_string().contains("at least 3"));
    }
}
