//! Cluster result types and the ordered accumulator used to build them.
//!
//! Field names on the wire follow the complaint API's existing JSON shape
//! (`cluster_name`, `complaints`, `probability`) so callers can serialize
//! results without a translation layer.

use super::{ClusterId, ClusteringMethod, ComplaintId, CorpusEntry, EmbeddingVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complaint's membership in a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    #[serde(rename = "id")]
    pub complaint_id: ComplaintId,
    pub title: String,
    /// Present on the centroid path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingVector>,
    /// Topic membership probability, present on the topic path.
    #[serde(
        rename = "probability",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub membership_score: Option<f32>,
}

/// A labelled group of complaints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: ClusterId,
    #[serde(rename = "cluster_name")]
    pub name: String,
    pub keywords: Vec<String>,
    pub count: usize,
    #[serde(rename = "complaints")]
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn new(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            name: String::new(),
            keywords: Vec::new(),
            count: 0,
            members: Vec::new(),
        }
    }

    pub fn push(&mut self, member: ClusterMember) {
        self.members.push(member);
        self.count += 1;
    }

    pub fn titles(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.title.as_str()).collect()
    }
}

/// Ordered map from cluster key to cluster, iterated in insertion order.
///
/// Keys may be sparse or arrive in any order; output order is the order in
/// which each key was first seen.
#[derive(Debug, Default)]
pub struct ClusterAccumulator {
    clusters: Vec<Cluster>,
    positions: HashMap<ClusterId, usize>,
}

impl ClusterAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cluster for `id`, creating it at the end if unseen.
    pub fn entry(&mut self, id: ClusterId) -> &mut Cluster {
        let index = match self.positions.get(&id) {
            Some(&index) => index,
            None => {
                self.clusters.push(Cluster::new(id));
                let index = self.clusters.len() - 1;
                self.positions.insert(id, index);
                index
            }
        };
        &mut self.clusters[index]
    }

    pub fn push_member(&mut self, id: ClusterId, member: ClusterMember) {
        self.entry(id).push(member);
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cluster> {
        self.clusters.iter_mut()
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }
}

/// The normalized output of a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// Algorithm that actually produced the clusters.
    pub method: ClusteringMethod,
    pub clusters: Vec<Cluster>,
    pub total_clusters: usize,
    /// Complaints assigned to some cluster (outliers excluded).
    pub total_complaints: usize,
    /// Topic path only: complaints not assigned to any topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outliers: Option<usize>,
}

/// One row the caller writes when replacing stored embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub complaint_id: ComplaintId,
    pub cluster_id: ClusterId,
    pub embedding: EmbeddingVector,
    pub similarity_score: Option<f32>,
}

impl ClusteringResult {
    pub fn new(
        method: ClusteringMethod,
        clusters: Vec<Cluster>,
        total_complaints: usize,
        outliers: Option<usize>,
    ) -> Self {
        Self {
            method,
            total_clusters: clusters.len(),
            clusters,
            total_complaints,
            outliers,
        }
    }

    /// Sum of member counts over all clusters.
    pub fn assigned_complaints(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }

    /// Cluster holding `complaint`, if any.
    pub fn cluster_of(&self, complaint: ComplaintId) -> Option<ClusterId> {
        self.clusters
            .iter()
            .find(|c| c.members.iter().any(|m| m.complaint_id == complaint))
            .map(|c| c.cluster_id)
    }

    /// `(complaint, cluster)` pairs ordered by complaint id.
    pub fn assignments(&self) -> Vec<(ComplaintId, ClusterId)> {
        let mut pairs: Vec<(ComplaintId, ClusterId)> = self
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |m| (m.complaint_id, c.cluster_id)))
            .collect();
        pairs.sort_by_key(|(complaint, _)| *complaint);
        pairs
    }

    /// Members that carry embeddings, shaped as a similarity search corpus.
    pub fn similarity_corpus(&self) -> Vec<CorpusEntry> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .filter(|m| m.embedding.is_some())
            .map(|m| CorpusEntry {
                id: m.complaint_id,
                title: m.title.clone(),
                embedding: m.embedding.clone(),
            })
            .collect()
    }

    /// Rows for the caller's embedding table.
    ///
    /// Topic-path members have no embedding and are written with an empty
    /// vector, matching what the complaint API stores today.
    pub fn stored_embeddings(&self) -> Vec<StoredEmbedding> {
        self.clusters
            .iter()
            .flat_map(|c| {
                c.members.iter().map(move |m| StoredEmbedding {
                    complaint_id: m.complaint_id,
                    cluster_id: c.cluster_id,
                    embedding: m.embedding.clone().unwrap_or_default(),
                    similarity_score: m.membership_score,
                })
            })
            .collect()
    }
}
