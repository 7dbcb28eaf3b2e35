//! Complaint clustering core for a civic grievance platform.
//!
//! Turns complaint title/description pairs into multilingual sentence
//! embeddings, groups them with seeded k-means or density-based topic
//! discovery, labels every group from its keywords and ranks stored
//! complaints by cosine similarity.
//!
//! The entry point is [`ComplaintClusteringService`].

pub mod clustering;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod keywords;
pub mod search;
pub mod topics;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use clustering::{ClusteringOptions, ComplaintClusteringService};
pub use config::Settings;
pub use error::{ClusteringError, EmbeddingError, EmbeddingResult, SearchError, TopicModelError};
pub use keywords::{ClusterNamer, KeywordExtractor};
pub use types::{
    Cluster, ClusterId, ClusterMember, ClusteringMethod, ClusteringResult, ComplaintId,
    ComplaintRecord, CorpusEntry, EmbeddingVector, SimilarityMatch, StoredEmbedding,
};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, VectorDimension};
