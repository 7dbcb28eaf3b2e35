//! Type-safe wrappers for embedding dimensions.

use crate::error::EmbeddingError;

/// Dimension of the MiniLM family of sentence embedding models.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Dimension of the base-size multilingual E5 model.
pub const VECTOR_DIMENSION_768: usize = 768;

/// Validated, non-zero embedding dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension`, rejecting zero.
    pub fn new(dim: usize) -> Option<Self> {
        (dim > 0).then_some(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        if vector.len() != self.0 {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
