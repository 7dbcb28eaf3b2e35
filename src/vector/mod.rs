//! Vector layer for complaint clustering.
//!
//! This module turns complaint text into sentence embeddings and provides the
//! numeric kernels that operate on them.
//!
//! # Architecture
//! - [`embedding`]: the [`EmbeddingGenerator`] seam and its fastembed-backed
//!   implementation.
//! - [`clustering`]: seeded K-means++ with cosine geometry, used by the
//!   centroid path.
//! - [`density`]: HDBSCAN-style density clustering, used by the topic path.
//!
//! All kernels are synchronous and single-threaded; a clustering run is a
//! batch job over the full complaint set.

pub mod clustering;
pub mod density;
pub mod embedding;
mod types;

// Re-export core types for public API
pub use clustering::{
    KMeansConfig, KMeansError, KMeansResult, assign_to_nearest_centroid, cosine_similarity,
    kmeans_clustering,
};
pub use density::{
    DensityClustering, DensityError, DensityParams, OUTLIER_TOPIC, density_clustering,
};
#[cfg(test)]
pub use embedding::{
    FailingEmbeddingGenerator, MockEmbeddingGenerator, TruncatingEmbeddingGenerator,
};
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, GeneratorOptions, model_to_string,
    parse_embedding_model, validate_batch,
};
pub use types::{VECTOR_DIMENSION_384, VECTOR_DIMENSION_768, VectorDimension};
