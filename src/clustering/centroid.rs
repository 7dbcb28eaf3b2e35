use super::{ComplaintClusteringService, documents};
use crate::error::ClusteringError;
use crate::types::{
    ClusterAccumulator, ClusterId, ClusterMember, ClusteringMethod, ClusteringResult,
    ComplaintRecord,
};
use crate::vector::kmeans_clustering;

/// Cluster count actually used for a batch of `len` records.
///
/// A request for more clusters than records is reduced to half the batch,
/// never below one.
pub fn effective_cluster_count(len: usize, requested: usize) -> usize {
    if len < requested {
        (len / 2).max(1)
    } else {
        requested
    }
}

impl ComplaintClusteringService {
    /// Partition `records` into `clusters` groups with seeded k-means.
    ///
    /// Every record lands in exactly one cluster, ids are the raw 0-based
    /// group indices and members carry their embeddings. Keywords come from
    /// member titles.
    ///
    /// # Errors
    /// Empty input, embedding failure or an invalid cluster count.
    pub fn cluster_via_centroids(
        &self,
        records: &[ComplaintRecord],
        clusters: usize,
    ) -> Result<ClusteringResult, ClusteringError> {
        if records.is_empty() {
            return Err(ClusteringError::EmptyInput);
        }

        let k = effective_cluster_count(records.len(), clusters);
        if k != clusters {
            tracing::debug!(requested = clusters, effective = k, "reduced cluster count");
        }

        let documents = documents(records);
        let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
        let embeddings = self.generate_embeddings(&texts)?;

        let partition = kmeans_clustering(&embeddings, k, &self.options.kmeans)?;
        tracing::debug!(
            k,
            iterations = partition.iterations,
            "k-means partition finished"
        );

        let mut accumulator = ClusterAccumulator::new();
        for ((record, embedding), &group) in records
            .iter()
            .zip(embeddings)
            .zip(&partition.assignments)
        {
            accumulator.push_member(
                ClusterId::new(group as u32),
                ClusterMember {
                    complaint_id: record.id,
                    title: record.title.clone(),
                    embedding: Some(embedding),
                    membership_score: None,
                },
            );
        }

        for cluster in accumulator.iter_mut() {
            self.label_from_titles(cluster);
        }

        Ok(ClusteringResult::new(
            ClusteringMethod::KMeans,
            accumulator.into_clusters(),
            records.len(),
            None,
        ))
    }
}
