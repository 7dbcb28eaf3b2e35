mod cluster;

pub use cluster::{Cluster, ClusterAccumulator, ClusterMember, ClusteringResult, StoredEmbedding};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An embedding vector as produced by the configured model.
pub type EmbeddingVector = Vec<f32>;

/// Identifier of a complaint in the caller's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(pub u64);

impl ComplaintId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-run cluster identifier.
///
/// Centroid runs use the raw 0-based group index; topic runs use the topic
/// number after size ordering. Ids are not stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u32);

impl ClusterId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a complaint handed to the clustering pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: ComplaintId,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ComplaintRecord {
    pub fn new(id: u64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ComplaintId(id),
            title: title.into(),
            description: description.into(),
        }
    }

    /// The text that gets embedded: title and description joined by a period.
    pub fn document(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }
}

/// A stored complaint embedding used as similarity search corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: ComplaintId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingVector>,
}

/// One ranked hit from similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub complaint_id: ComplaintId,
    pub title: String,
    pub similarity_score: f32,
}

/// Which grouping algorithm produced (or should produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMethod {
    /// Seeded k-means over embeddings.
    #[default]
    #[serde(alias = "centroid", alias = "centroids")]
    KMeans,
    /// Density-based topic discovery with outliers.
    #[serde(alias = "bertopic", alias = "topic")]
    Topics,
}

impl ClusteringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusteringMethod::KMeans => "kmeans",
            ClusteringMethod::Topics => "topics",
        }
    }
}

impl std::fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusteringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kmeans" | "k-means" | "centroid" | "centroids" => Ok(ClusteringMethod::KMeans),
            "topics" | "topic" | "bertopic" => Ok(ClusteringMethod::Topics),
            other => Err(format!(
                "Unknown clustering method '{other}'. Expected 'kmeans' or 'topics'"
            )),
        }
    }
}
