//! Cosine-similarity search over previously embedded complaints.
//!
//! The corpus is fetched by the caller (typically from its embedding table
//! or from [`ClusteringResult::similarity_corpus`]) and ranked in memory.
//!
//! [`ClusteringResult::similarity_corpus`]: crate::types::ClusteringResult::similarity_corpus

use crate::error::{EmbeddingError, SearchError};
use crate::types::{CorpusEntry, SimilarityMatch};
use crate::vector::{EmbeddingGenerator, cosine_similarity};

/// Matches returned when the caller has no preference.
pub const DEFAULT_TOP_K: usize = 5;

/// Rank `corpus` against an already embedded query.
///
/// Entries without an embedding are skipped, as are entries whose
/// dimension differs from the query. Zero vectors score `0.0`.
pub fn rank_by_similarity(
    query: &[f32],
    corpus: &[CorpusEntry],
    top_k: usize,
) -> Vec<SimilarityMatch> {
    let mut matches: Vec<SimilarityMatch> = corpus
        .iter()
        .filter_map(|entry| {
            let embedding = entry.embedding.as_deref()?;
            if embedding.len() != query.len() {
                tracing::warn!(
                    complaint = %entry.id,
                    expected = query.len(),
                    actual = embedding.len(),
                    "skipping stored embedding with mismatched dimension"
                );
                return None;
            }
            Some(SimilarityMatch {
                complaint_id: entry.id,
                title: entry.title.clone(),
                similarity_score: cosine_similarity(query, embedding),
            })
        })
        .collect();

    matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    matches.truncate(top_k);
    matches
}

/// Embed `query` and rank `corpus` against it.
pub fn try_find_similar(
    generator: &dyn EmbeddingGenerator,
    query: &str,
    corpus: &[CorpusEntry],
    top_k: usize,
) -> Result<Vec<SimilarityMatch>, SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let query_embedding = generator
        .generate_embeddings(&[query])?
        .into_iter()
        .next()
        .ok_or(EmbeddingError::EmptyOutput { inputs: 1 })?;

    let matches = rank_by_similarity(&query_embedding, corpus, top_k);
    tracing::debug!(
        corpus = corpus.len(),
        matches = matches.len(),
        "similarity search finished"
    );
    Ok(matches)
}

/// Like [`try_find_similar`], but any failure yields an empty list.
pub fn find_similar(
    generator: &dyn EmbeddingGenerator,
    query: &str,
    corpus: &[CorpusEntry],
    top_k: usize,
) -> Vec<SimilarityMatch> {
    try_find_similar(generator, query, corpus, top_k).unwrap_or_else(|e| {
        tracing::error!(error = %e, "similarity search failed");
        Vec::new()
    })
}
