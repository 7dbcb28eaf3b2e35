//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed (an empty similarity result is acceptable)
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - critical failure that should halt automation
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{ClusteringError, EmbeddingError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Search ran but nothing matched (code 3)
    NotFound = 3,

    /// Input file could not be parsed (code 4)
    InvalidInput = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Embedding model could not be loaded or run (code 7)
    ModelError = 7,

    /// Batch too small to cluster (code 8)
    InsufficientData = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Exit code for a search based on whether anything matched.
    pub fn from_matches<T>(matches: &[T]) -> Self {
        if matches.is_empty() {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Convert a `ClusteringError` to the appropriate exit code.
    pub fn from_error(error: &ClusteringError) -> Self {
        match error {
            ClusteringError::EmptyInput | ClusteringError::NotEnoughComplaints { .. } => {
                ExitCode::InsufficientData
            }
            ClusteringError::Embedding(e) => Self::from_embedding_error(e),
            ClusteringError::KMeans(_) => ExitCode::GeneralError,
        }
    }

    pub fn from_embedding_error(error: &EmbeddingError) -> Self {
        match error {
            EmbeddingError::UnknownModel(_) => ExitCode::ConfigError,
            EmbeddingError::ModelInit(_) | EmbeddingError::Generation(_) => ExitCode::ModelError,
            // A poisoned lock or malformed batch means the model is unusable
            EmbeddingError::MutexPoisoned
            | EmbeddingError::EmptyOutput { .. }
            | EmbeddingError::CountMismatch { .. }
            | EmbeddingError::DimensionMismatch { .. } => ExitCode::BlockingError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::ModelError => "Embedding model error",
            ExitCode::InsufficientData => "Not enough complaints",
        }
    }
}
