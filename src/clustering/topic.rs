use super::{ComplaintClusteringService, documents};
use crate::error::{ClusteringError, TopicModelError};
use crate::types::{
    ClusterAccumulator, ClusterId, ClusterMember, ClusteringMethod, ClusteringResult,
    ComplaintRecord,
};
use crate::topics::TopicModel;

impl ComplaintClusteringService {
    /// Group `records` into discovered topics.
    ///
    /// Batches below the topic threshold are clustered with k-means using
    /// the small-batch cluster count. If topic discovery fails for any
    /// reason the run falls back to k-means with the default cluster count;
    /// [`ClusteringResult::method`] tells the caller which path ran.
    ///
    /// # Errors
    /// Empty input, or a failure of the k-means fallback.
    pub fn cluster_via_topics(
        &self,
        records: &[ComplaintRecord],
    ) -> Result<ClusteringResult, ClusteringError> {
        if records.is_empty() {
            return Err(ClusteringError::EmptyInput);
        }

        if records.len() < self.options.topic_min_records {
            tracing::debug!(
                records = records.len(),
                threshold = self.options.topic_min_records,
                "batch too small for topic discovery, using k-means"
            );
            return self.cluster_via_centroids(records, self.options.small_batch_clusters);
        }

        match self.discover_topics(records) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(error = %e, "topic discovery failed, falling back to k-means");
                self.cluster_via_centroids(records, self.options.default_clusters)
            }
        }
    }

    fn discover_topics(
        &self,
        records: &[ComplaintRecord],
    ) -> Result<ClusteringResult, TopicModelError> {
        let documents = documents(records);
        let fitted =
            TopicModel::new(self.options.topics).fit(&documents, self.generator.as_ref())?;

        let mut accumulator = ClusterAccumulator::new();
        let mut outliers = 0;
        for ((record, &topic), &probability) in records
            .iter()
            .zip(&fitted.topics)
            .zip(&fitted.probabilities)
        {
            let Ok(topic) = u32::try_from(topic) else {
                outliers += 1;
                continue;
            };
            accumulator.push_member(
                ClusterId::new(topic),
                ClusterMember {
                    complaint_id: record.id,
                    title: record.title.clone(),
                    embedding: None,
                    membership_score: Some(probability),
                },
            );
        }

        for cluster in accumulator.iter_mut() {
            let keywords = fitted
                .topic_keywords(cluster.cluster_id.get() as i32)
                .to_vec();
            self.label_from_keywords(cluster, keywords);
        }

        Ok(ClusteringResult::new(
            ClusteringMethod::Topics,
            accumulator.into_clusters(),
            records.len() - outliers,
            Some(outliers),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{mock_service, records};
    use super::*;
    use crate::clustering::ClusteringOptions;
    use crate::types::ComplaintId;
    use crate::error::EmbeddingError;
    use crate::vector::{
        FailingEmbeddingGenerator, MockEmbeddingGenerator, TruncatingEmbeddingGenerator,
    };
    use std::sync::Arc;

    #[test]
    fn test_topics_with_outlier() {
        let service = mock_service();
        let batch = records(&[
            "Water pipe leaking",
            "Water logging on road",
            "No water since morning",
            "Garbage dumped in park",
            "Water tank overflowing",
            "Road full of water",
        ]);
        let result = service.cluster_via_topics(&batch).unwrap();

        assert_eq!(result.method, ClusteringMethod::Topics);
        assert_eq!(result.total_clusters, 2);
        assert_eq!(result.outliers, Some(1));
        assert_eq!(result.total_complaints, 5);
        assert_eq!(
            result.total_complaints + result.outliers.unwrap_or(0),
            batch.len()
        );
        assert_eq!(result.cluster_of(ComplaintId::new(4)), None);

        // Topic 0 is the larger topic
        assert_eq!(result.clusters[0].cluster_id, ClusterId::new(0));
        assert_eq!(result.clusters[0].name, "Water Supply Issues");
        assert_eq!(result.clusters[0].count, 3);
        assert_eq!(result.clusters[1].name, "Road Problems");
        assert_eq!(result.clusters[1].keywords[0], "road");

        for member in result.clusters.iter().flat_map(|c| &c.members) {
            assert!(member.embedding.is_none());
            let p = member.membership_score.unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_small_batch_uses_two_centroids() {
        let service = mock_service();
        let batch = records(&["Water leak", "Garbage pile", "Water cut", "Garbage bin"]);
        let result = service.cluster_via_topics(&batch).unwrap();

        assert_eq!(result.method, ClusteringMethod::KMeans);
        assert_eq!(result.total_clusters, 2);
        assert_eq!(result.assigned_complaints(), 4);
    }

    #[test]
    fn test_no_topic_falls_back_to_default_k() {
        let service = mock_service();
        // Indistinguishable complaints form no topic below the whole batch
        let batch = records(&[
            "Stray dogs in colony",
            "Noise from construction",
            "Illegal parking outside",
            "Shop encroaching footpath",
            "Loud music at night",
        ]);
        let result = service.cluster_via_topics(&batch).unwrap();

        assert_eq!(result.method, ClusteringMethod::KMeans);
        assert_eq!(result.total_complaints, 5);
        assert_eq!(result.assigned_complaints(), 5);
        assert_eq!(result.outliers, None);
    }

    #[test]
    fn test_embedding_failure_surfaces_after_fallback() {
        let service = ComplaintClusteringService::new(
            Arc::new(FailingEmbeddingGenerator),
            ClusteringOptions::default(),
        );
        let batch = records(&["a", "b", "c", "d", "e", "f"]);

        assert!(matches!(
            service.cluster_via_topics(&batch),
            Err(ClusteringError::Embedding(_))
        ));
    }

    #[test]
    fn test_short_embedding_batch_never_drops_records() {
        let service = ComplaintClusteringService::new(
            Arc::new(TruncatingEmbeddingGenerator(MockEmbeddingGenerator::new())),
            ClusteringOptions::default(),
        );
        let batch = records(&[
            "Water pipe leaking",
            "No water since morning",
            "Water tank overflowing",
            "Garbage dumped in park",
            "Garbage not collected",
            "Road full of potholes",
            "Pothole near school",
        ]);

        // Topic discovery rejects the batch and the fallback surfaces the
        // same mismatch instead of returning a partial result.
        assert!(matches!(
            service.cluster_via_topics(&batch),
            Err(ClusteringError::Embedding(EmbeddingError::CountMismatch {
                expected: 7,
                actual: 6
            }))
        ));
    }
}
