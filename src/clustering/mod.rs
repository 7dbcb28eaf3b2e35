//! Complaint clustering orchestration.
//!
//! [`ComplaintClusteringService`] is the entry point for a clustering run:
//! it embeds complaint documents, groups them with one of two algorithms,
//! labels every group and returns a normalized [`ClusteringResult`].
//!
//! # Algorithms
//! - Centroid ([`ClusteringMethod::KMeans`]): a fixed number of groups;
//!   every complaint lands in exactly one cluster.
//! - Topics ([`ClusteringMethod::Topics`]): a discovered number of topics
//!   with membership probabilities; complaints outside every topic are
//!   counted as outliers. Small batches and topic-model failures fall back
//!   to the centroid path.
//!
//! # Example
//! ```no_run
//! use civitas::{ClusteringMethod, ComplaintClusteringService, ComplaintRecord, Settings};
//!
//! let settings = Settings::load().unwrap_or_default();
//! let service = ComplaintClusteringService::from_settings(&settings)?;
//! let records = vec![
//!     ComplaintRecord::new(1, "Water pipe burst", "Main road flooded"),
//!     ComplaintRecord::new(2, "No water supply", "Since two days"),
//!     ComplaintRecord::new(3, "Garbage not collected", "Bins overflowing"),
//! ];
//! let result = service.cluster(&records, ClusteringMethod::KMeans, Some(2))?;
//! for cluster in &result.clusters {
//!     println!("{}: {}", cluster.name, cluster.count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod centroid;
mod topic;

use crate::config::Settings;
use crate::error::{ClusteringError, EmbeddingError, SearchError};
use crate::keywords::{ClusterNamer, KeywordExtractor};
use crate::search;
use crate::topics::TopicModelParams;
use crate::types::{
    Cluster, ClusteringMethod, ClusteringResult, ComplaintRecord, CorpusEntry, EmbeddingVector,
    SimilarityMatch,
};
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator, KMeansConfig, validate_batch};
use std::sync::Arc;

pub use centroid::effective_cluster_count;

/// Upper bound on keywords attached to a cluster.
pub const MAX_CLUSTER_KEYWORDS: usize = 5;

/// Tuning for a [`ComplaintClusteringService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOptions {
    /// Cluster count used when a request does not specify one, and by the
    /// topic-model fallback.
    pub default_clusters: usize,
    /// Requests below this size are rejected by [`ComplaintClusteringService::cluster`].
    pub min_complaints: usize,
    pub kmeans: KMeansConfig,
    pub keywords_top_n: usize,
    pub topics: TopicModelParams,
    /// Topic path batches below this size use k-means with `small_batch_clusters`.
    pub topic_min_records: usize,
    pub small_batch_clusters: usize,
    pub similarity_top_k: usize,
}

impl ClusteringOptions {
    /// Keyword counts above [`MAX_CLUSTER_KEYWORDS`] are capped.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut topics = settings.topics.model_params();
        topics.keywords_per_topic =
            cap_keywords("topics.keywords_per_topic", topics.keywords_per_topic);

        Self {
            default_clusters: settings.clustering.default_clusters,
            min_complaints: settings.clustering.min_complaints,
            kmeans: settings.clustering.kmeans_config(),
            keywords_top_n: cap_keywords("keywords.top_n", settings.keywords.top_n),
            topics,
            topic_min_records: settings.topics.min_records,
            small_batch_clusters: settings.topics.small_batch_clusters,
            similarity_top_k: settings.similarity.top_k,
        }
    }
}

fn cap_keywords(setting: &str, value: usize) -> usize {
    if value > MAX_CLUSTER_KEYWORDS {
        tracing::warn!(
            setting,
            value,
            max = MAX_CLUSTER_KEYWORDS,
            "keyword count capped"
        );
    }
    value.min(MAX_CLUSTER_KEYWORDS)
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Clustering and similarity entry points sharing one embedding model.
///
/// Construct once and reuse; the model is loaded a single time and shared
/// through an `Arc`.
pub struct ComplaintClusteringService {
    generator: Arc<dyn EmbeddingGenerator>,
    options: ClusteringOptions,
    extractor: KeywordExtractor,
    namer: ClusterNamer,
}

impl std::fmt::Debug for ComplaintClusteringService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplaintClusteringService")
            .field("dimension", &self.generator.dimension())
            .field("options", &self.options)
            .finish()
    }
}

impl ComplaintClusteringService {
    pub fn new(generator: Arc<dyn EmbeddingGenerator>, options: ClusteringOptions) -> Self {
        Self {
            generator,
            extractor: KeywordExtractor::new(options.keywords_top_n),
            namer: ClusterNamer::new(),
            options,
        }
    }

    /// Load the configured fastembed model and build a service around it.
    ///
    /// # Errors
    /// Returns an error for an unknown model name or when the model cannot
    /// be loaded.
    pub fn from_settings(settings: &Settings) -> Result<Self, EmbeddingError> {
        let generator = FastEmbedGenerator::new(settings.embedding.generator_options()?)?;
        Ok(Self::new(
            Arc::new(generator),
            ClusteringOptions::from_settings(settings),
        ))
    }

    pub fn generator(&self) -> &Arc<dyn EmbeddingGenerator> {
        &self.generator
    }

    pub fn options(&self) -> &ClusteringOptions {
        &self.options
    }

    /// Embed `texts`, one vector per text in input order.
    ///
    /// # Errors
    /// Any model failure, or a batch with the wrong count or dimension.
    pub fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let embeddings = self
            .generator
            .generate_embeddings(texts)
            .and_then(|embeddings| {
                validate_batch(texts.len(), &embeddings, self.generator.dimension())?;
                Ok(embeddings)
            });

        if let Err(e) = &embeddings {
            tracing::error!(error = %e, texts = texts.len(), "embedding generation failed");
        }
        embeddings
    }

    /// Run a clustering request.
    ///
    /// `clusters` applies to the centroid path only and defaults to
    /// [`ClusteringOptions::default_clusters`].
    ///
    /// # Errors
    /// Rejects batches below [`ClusteringOptions::min_complaints`] and
    /// surfaces any centroid-path failure.
    pub fn cluster(
        &self,
        records: &[ComplaintRecord],
        method: ClusteringMethod,
        clusters: Option<usize>,
    ) -> Result<ClusteringResult, ClusteringError> {
        if records.is_empty() {
            return Err(ClusteringError::EmptyInput);
        }
        if records.len() < self.options.min_complaints {
            return Err(ClusteringError::NotEnoughComplaints {
                required: self.options.min_complaints,
                actual: records.len(),
            });
        }

        let result = match method {
            ClusteringMethod::KMeans => self.cluster_via_centroids(
                records,
                clusters.unwrap_or(self.options.default_clusters),
            ),
            ClusteringMethod::Topics => self.cluster_via_topics(records),
        }?;

        tracing::info!(
            requested = %method,
            method = %result.method,
            clusters = result.total_clusters,
            complaints = result.total_complaints,
            outliers = result.outliers.unwrap_or(0),
            "clustering run finished"
        );
        Ok(result)
    }

    /// Most similar stored complaints to `query`, empty on any failure.
    pub fn find_similar(
        &self,
        query: &str,
        corpus: &[CorpusEntry],
        top_k: usize,
    ) -> Vec<SimilarityMatch> {
        search::find_similar(self.generator.as_ref(), query, corpus, top_k)
    }

    /// Fallible form of [`Self::find_similar`].
    pub fn try_find_similar(
        &self,
        query: &str,
        corpus: &[CorpusEntry],
        top_k: usize,
    ) -> Result<Vec<SimilarityMatch>, SearchError> {
        search::try_find_similar(self.generator.as_ref(), query, corpus, top_k)
    }

    /// Fill in keywords and name of a cluster from its member titles.
    fn label_from_titles(&self, cluster: &mut Cluster) {
        let keywords = self.extractor.extract(&cluster.titles());
        cluster.name = self.namer.name(&keywords);
        cluster.keywords = keywords;
    }

    fn label_from_keywords(&self, cluster: &mut Cluster, keywords: Vec<String>) {
        cluster.name = self.namer.name(&keywords);
        cluster.keywords = keywords;
    }
}

fn documents(records: &[ComplaintRecord]) -> Vec<String> {
    records.iter().map(ComplaintRecord::document).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{FailingEmbeddingGenerator, MockEmbeddingGenerator};

    pub(super) fn mock_service() -> ComplaintClusteringService {
        ComplaintClusteringService::new(
            Arc::new(MockEmbeddingGenerator::new()),
            ClusteringOptions::default(),
        )
    }

    pub(super) fn records(titles: &[&str]) -> Vec<ComplaintRecord> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| ComplaintRecord::new(i as u64 + 1, *title, ""))
            .collect()
    }

    #[test]
    fn test_cluster_rejects_small_batches() {
        let service = mock_service();

        assert!(matches!(
            service.cluster(&[], ClusteringMethod::KMeans, None),
            Err(ClusteringError::EmptyInput)
        ));
        assert!(matches!(
            service.cluster(
                &records(&["Water leak", "Pothole"]),
                ClusteringMethod::Topics,
                None
            ),
            Err(ClusteringError::NotEnoughComplaints {
                required: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_cluster_dispatches_by_method() {
        let service = mock_service();
        let batch = records(&[
            "Water pipe leaking",
            "Garbage not collected",
            "No water supply",
            "Garbage dumped on corner",
        ]);

        let centroid = service
            .cluster(&batch, ClusteringMethod::KMeans, Some(2))
            .unwrap();
        assert_eq!(centroid.method, ClusteringMethod::KMeans);
        assert_eq!(centroid.total_clusters, 2);

        // Four records is below the topic threshold: k-means with k = 2
        let topics = service
            .cluster(&batch, ClusteringMethod::Topics, None)
            .unwrap();
        assert_eq!(topics.method, ClusteringMethod::KMeans);
        assert_eq!(topics.total_clusters, 2);
        assert_eq!(topics.outliers, None);
    }

    #[test]
    fn test_generate_embeddings_surfaces_failure() {
        let service = ComplaintClusteringService::new(
            Arc::new(FailingEmbeddingGenerator),
            ClusteringOptions::default(),
        );
        assert!(service.generate_embeddings(&["water"]).is_err());
        assert!(
            service
                .find_similar("water", &[], 5)
                .is_empty()
        );
    }

    #[test]
    fn test_keyword_settings_are_capped() {
        let mut settings = Settings::default();
        settings.keywords.top_n = 12;
        settings.topics.keywords_per_topic = 9;

        let options = ClusteringOptions::from_settings(&settings);
        assert_eq!(options.keywords_top_n, MAX_CLUSTER_KEYWORDS);
        assert_eq!(options.topics.keywords_per_topic, MAX_CLUSTER_KEYWORDS);

        settings.keywords.top_n = 3;
        assert_eq!(ClusteringOptions::from_settings(&settings).keywords_top_n, 3);

        let service = ComplaintClusteringService::new(
            Arc::new(MockEmbeddingGenerator::new()),
            ClusteringOptions::from_settings(&Settings {
                keywords: crate::config::KeywordsConfig { top_n: 50 },
                ..Settings::default()
            }),
        );
        let batch = records(&[
            "Water pipe leaking badly tonight",
            "Water supply stopped since morning hours",
            "Water tank overflowing onto street corner",
        ]);
        let result = service.cluster_via_centroids(&batch, 1).unwrap();
        assert!(result.clusters[0].keywords.len() <= MAX_CLUSTER_KEYWORDS);
    }

    #[test]
    fn test_generate_embeddings_preserves_order() {
        let service = mock_service();
        let embeddings = service
            .generate_embeddings(&["Pothole", "Water", "Garbage"])
            .unwrap();

        assert_eq!(embeddings.len(), 3);
        assert!(embeddings[0][2] > 0.5);
        assert!(embeddings[1][0] > 0.5);
        assert!(embeddings[2][4] > 0.5);
    }
}
