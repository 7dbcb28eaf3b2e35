//! Embedding generation for complaint text.
//!
//! The [`EmbeddingGenerator`] trait is the seam between the clustering
//! pipeline and the model. [`FastEmbedGenerator`] is the production
//! implementation; it loads a multilingual sentence model through fastembed
//! because the complaint corpus mixes English and Hindi.
//!
//! # Lifecycle
//! Construct one generator at process start, wrap it in an `Arc` and hand
//! that to every pipeline stage. It is never reconstructed. Inference takes
//! an internal lock, so concurrent callers are serialized rather than racing
//! on the model.

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::types::EmbeddingVector;
use crate::vector::{VECTOR_DIMENSION_384, VECTOR_DIMENSION_768, VectorDimension};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// Trait for generating embeddings from text.
///
/// Implementations of this trait should be thread-safe and
/// capable of handling batch processing efficiently.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// Returns one vector per input text, in input order, all of the same
    /// dimension. Empty input yields an empty output.
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Options for loading the fastembed model.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub model: EmbeddingModel,
    pub cache_dir: PathBuf,
    pub show_download_progress: bool,
    pub batch_size: Option<usize>,
}

/// FastEmbed implementation, multilingual paraphrase MiniLM by default.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
    batch_size: Option<usize>,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load the model described by `options`.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new(options: GeneratorOptions) -> EmbeddingResult<Self> {
        let model_name = model_to_string(&options.model);
        tracing::info!(
            model = %model_name,
            cache_dir = %options.cache_dir.display(),
            "loading embedding model"
        );

        let model = TextEmbedding::try_new(
            InitOptions::new(options.model.clone())
                .with_cache_dir(options.cache_dir)
                .with_show_download_progress(options.show_download_progress),
        )
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        let dimension = VectorDimension::new(model_dimension(&options.model))
            .unwrap_or_else(VectorDimension::dimension_384);

        Ok(Self {
            model: Mutex::new(model),
            model_name,
            dimension,
            batch_size: options.batch_size,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // fastembed expects owned strings for the embed method
        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::MutexPoisoned)?
            .embed(text_strings, self.batch_size)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;

        validate_batch(texts.len(), &embeddings, self.dimension)?;
        tracing::debug!(count = embeddings.len(), "generated embeddings");

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Check that a batch has one vector per input, all of `dimension`.
pub fn validate_batch(
    expected: usize,
    embeddings: &[EmbeddingVector],
    dimension: VectorDimension,
) -> EmbeddingResult<()> {
    if expected > 0 && embeddings.is_empty() {
        return Err(EmbeddingError::EmptyOutput { inputs: expected });
    }
    if embeddings.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: embeddings.len(),
        });
    }
    for embedding in embeddings {
        dimension.validate_vector(embedding)?;
    }
    Ok(())
}

/// Parse a configured model name.
pub fn parse_embedding_model(name: &str) -> EmbeddingResult<EmbeddingModel> {
    match name {
        "ParaphraseMLMiniLML12V2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        "ParaphraseMLMiniLML12V2Q" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2Q),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        "MultilingualE5Base" => Ok(EmbeddingModel::MultilingualE5Base),
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(EmbeddingError::UnknownModel(other.to_string())),
    }
}

/// Canonical config name for a model.
pub fn model_to_string(model: &EmbeddingModel) -> String {
    match model {
        EmbeddingModel::ParaphraseMLMiniLML12V2 => "ParaphraseMLMiniLML12V2".to_string(),
        EmbeddingModel::ParaphraseMLMiniLML12V2Q => "ParaphraseMLMiniLML12V2Q".to_string(),
        EmbeddingModel::MultilingualE5Small => "MultilingualE5Small".to_string(),
        EmbeddingModel::MultilingualE5Base => "MultilingualE5Base".to_string(),
        EmbeddingModel::AllMiniLML6V2 => "AllMiniLML6V2".to_string(),
        other => format!("{other:?}"),
    }
}

fn model_dimension(model: &EmbeddingModel) -> usize {
    match model {
        EmbeddingModel::MultilingualE5Base => VECTOR_DIMENSION_768,
        _ => VECTOR_DIMENSION_384,
    }
}

/// Mock embedding generator for testing.
///
/// Produces deterministic unit vectors from complaint vocabulary so that
/// complaints about the same civic issue land close together.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    const TOPICS: [&'static [&'static str]; 5] = [
        &["water", "pipe", "leak", "पानी"],
        &["road", "pothole", "सड़क"],
        &["garbage", "waste", "trash", "कचरा"],
        &["light", "lamp", "dark"],
        &["drain", "sewage", "flood"],
    ];

    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(16).expect("non-zero"),
        }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>> {
        let dim = self.dimension.get();
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let lower = text.to_lowercase();
            let mut embedding = vec![0.01; dim];

            for (slot, words) in Self::TOPICS.iter().enumerate() {
                if words.iter().any(|w| lower.contains(w)) {
                    embedding[slot * 2] = 0.9;
                    embedding[slot * 2 + 1] = 0.7;
                }
            }

            // Normalize to unit length (like real embeddings)
            let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            for val in &mut embedding {
                *val /= magnitude;
            }

            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Generator that always fails, for exercising error paths.
#[cfg(test)]
pub struct FailingEmbeddingGenerator;

#[cfg(test)]
impl EmbeddingGenerator for FailingEmbeddingGenerator {
    fn generate_embeddings(&self, _texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>> {
        Err(EmbeddingError::Generation("model unavailable".to_string()))
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::dimension_384()
    }
}

/// Generator that drops the last vector of every batch.
#[cfg(test)]
pub struct TruncatingEmbeddingGenerator(pub MockEmbeddingGenerator);

#[cfg(test)]
impl EmbeddingGenerator for TruncatingEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>> {
        let mut embeddings = self.0.generate_embeddings(texts)?;
        embeddings.pop();
        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.0.dimension()
    }
}
