use super::ctfidf::top_terms_per_topic;
use crate::error::TopicModelError;
use crate::vector::{
    DensityParams, EmbeddingGenerator, OUTLIER_TOPIC, density_clustering, validate_batch,
};

/// Default minimum number of documents per topic.
pub const DEFAULT_MIN_TOPIC_SIZE: usize = 2;

/// Default number of c-TF-IDF terms kept per topic.
pub const DEFAULT_KEYWORDS_PER_TOPIC: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicModelParams {
    pub min_topic_size: usize,
    pub keywords_per_topic: usize,
}

impl Default for TopicModelParams {
    fn default() -> Self {
        Self {
            min_topic_size: DEFAULT_MIN_TOPIC_SIZE,
            keywords_per_topic: DEFAULT_KEYWORDS_PER_TOPIC,
        }
    }
}

/// Output of fitting the topic model to a document batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAssignments {
    /// Topic per document, `0..` by descending size, or [`OUTLIER_TOPIC`].
    pub topics: Vec<i32>,
    /// Membership probability per document in `[0, 1]`.
    pub probabilities: Vec<f32>,
    /// c-TF-IDF keywords, indexed by topic.
    pub keywords: Vec<Vec<String>>,
}

impl TopicAssignments {
    pub fn topic_count(&self) -> usize {
        self.keywords.len()
    }

    pub fn outlier_count(&self) -> usize {
        self.topics.iter().filter(|&&t| t == OUTLIER_TOPIC).count()
    }

    /// Keywords for `topic`; empty for the outlier topic.
    pub fn topic_keywords(&self, topic: i32) -> &[String] {
        usize::try_from(topic)
            .ok()
            .and_then(|t| self.keywords.get(t))
            .map_or(&[], Vec::as_slice)
    }
}

/// Embedding-based topic model: density clustering over sentence
/// embeddings, with topics described by c-TF-IDF terms.
#[derive(Debug, Clone, Default)]
pub struct TopicModel {
    params: TopicModelParams,
}

impl TopicModel {
    pub fn new(params: TopicModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TopicModelParams {
        &self.params
    }

    /// Discover topics in `documents`.
    ///
    /// # Errors
    /// Fails when there are fewer documents than the minimum topic size,
    /// when embedding fails, or when no topic emerges.
    pub fn fit<S: AsRef<str>>(
        &self,
        documents: &[S],
        generator: &dyn EmbeddingGenerator,
    ) -> Result<TopicAssignments, TopicModelError> {
        if documents.len() < self.params.min_topic_size {
            return Err(TopicModelError::TooFewDocuments {
                required: self.params.min_topic_size,
                actual: documents.len(),
            });
        }

        let texts: Vec<&str> = documents.iter().map(AsRef::as_ref).collect();
        let embeddings = generator.generate_embeddings(&texts)?;
        // One label per document, or the caller would lose records silently.
        validate_batch(texts.len(), &embeddings, generator.dimension())?;
        tracing::debug!(documents = texts.len(), "embedded topic documents");

        let density = density_clustering(
            &embeddings,
            &DensityParams::with_min_cluster_size(self.params.min_topic_size),
        )?;

        let topic_count = density.cluster_count();
        if topic_count == 0 {
            return Err(TopicModelError::NoTopics {
                documents: texts.len(),
            });
        }

        let mut grouped: Vec<Vec<&str>> = vec![Vec::new(); topic_count];
        for (text, &topic) in texts.iter().zip(&density.labels) {
            if let Ok(topic) = usize::try_from(topic) {
                grouped[topic].push(text);
            }
        }
        let keywords = top_terms_per_topic(&grouped, self.params.keywords_per_topic);

        Ok(TopicAssignments {
            topics: density.labels,
            probabilities: density.probabilities,
            keywords,
        })
    }
}
