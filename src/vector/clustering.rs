//! K-means clustering over complaint embeddings.
//!
//! This module provides a pure Rust implementation of K-means clustering
//! for sentence embedding vectors. It uses cosine similarity as the
//! distance metric and K-means++ for centroid initialization.
//!
//! # Algorithm Details
//! - Distance metric: Cosine similarity (not Euclidean)
//! - Initialization: K-means++ driven by a seeded RNG
//! - Max iterations: 100 by default
//! - Convergence tolerance: 1e-4 by default
//!
//! Every random choice comes from one `StdRng` seeded from
//! [`KMeansConfig::seed`], so identical input and seed produce identical
//! assignments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Default maximum number of Lloyd iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default convergence tolerance for centroid updates.
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 42;

/// Epsilon for floating-point comparisons.
const EPSILON: f32 = 1e-10;

/// Tuning knobs for [`kmeans_clustering`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansConfig {
    pub max_iterations: usize,
    pub tolerance: f32,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Result of K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids, each a unit vector of the input dimension.
    pub centroids: Vec<Vec<f32>>,

    /// 0-based cluster index for each input vector.
    pub assignments: Vec<usize>,

    /// Number of iterations until convergence.
    pub iterations: usize,
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum KMeansError {
    #[error(
        "Empty vector set provided for clustering\nSuggestion: Ensure vectors are generated before clustering"
    )]
    EmptyVectorSet,

    #[error("Invalid cluster count: {0}\nSuggestion: Use k between 1 and the number of vectors")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,

    #[error(
        "Non-finite value in input vectors\nSuggestion: Check that vectors contain valid floating-point values"
    )]
    NonFiniteInput,
}

/// Performs K-means clustering on a set of vectors using cosine similarity.
///
/// # Arguments
/// * `vectors` - Input vectors to cluster (must be non-empty and same dimension)
/// * `k` - Number of clusters (must be >= 1 and <= number of vectors)
/// * `config` - Iteration limits and RNG seed
///
/// # Algorithm
/// 1. Initialize centroids using K-means++ method
/// 2. Iterate until convergence or max iterations:
///    - Assign each vector to nearest centroid (by cosine similarity)
///    - Update centroids as mean of assigned vectors
///    - Check convergence based on centroid movement
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn kmeans_clustering(
    vectors: &[Vec<f32>],
    k: usize,
    config: &KMeansConfig,
) -> Result<KMeansResult, KMeansError> {
    if vectors.is_empty() {
        return Err(KMeansError::EmptyVectorSet);
    }

    if k == 0 || k > vectors.len() {
        return Err(KMeansError::InvalidClusterCount(k));
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(KMeansError::DimensionMismatch);
    }
    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        return Err(KMeansError::NonFiniteInput);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut centroids = initialize_centroids_kmeans_plus_plus(vectors, k, &mut rng);
    let mut assignments = vec![usize::MAX; vectors.len()];
    let mut iterations = 0;

    loop {
        iterations += 1;

        // Assignment step
        let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
        let new_assignments: Vec<usize> = vectors
            .iter()
            .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
            .collect();

        let converged = new_assignments == assignments;
        assignments = new_assignments;

        if converged || iterations >= config.max_iterations {
            break;
        }

        // Update step
        let new_centroids = update_centroids(vectors, &assignments, k, &mut rng);
        let centroid_movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if centroid_movement < config.tolerance {
            // Centroids settled; make assignments consistent with them.
            let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
            assignments = vectors
                .iter()
                .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
                .collect();
            break;
        }
    }

    if iterations >= config.max_iterations {
        tracing::warn!(
            iterations = config.max_iterations,
            "k-means did not fully converge"
        );
    }

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
    })
}

/// Assigns a vector to the nearest centroid based on cosine similarity.
///
/// Ties go to the lowest index.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[&[f32]]) -> usize {
    let mut best_similarity = f32::NEG_INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = cosine_similarity(vector, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_cluster = i;
        }
    }

    best_cluster
}

/// Updates centroids as the normalized mean of their assigned vectors.
fn update_centroids(
    vectors: &[Vec<f32>],
    assignments: &[usize],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    let dimension = vectors[0].len();
    let mut new_centroids = vec![vec![0.0; dimension]; k];
    let mut cluster_sizes = vec![0usize; k];

    for (vector, &cluster_idx) in vectors.iter().zip(assignments.iter()) {
        for (i, &value) in vector.iter().enumerate() {
            new_centroids[cluster_idx][i] += value;
        }
        cluster_sizes[cluster_idx] += 1;
    }

    for (centroid, &size) in new_centroids.iter_mut().zip(cluster_sizes.iter()) {
        if size == 0 {
            // Empty cluster: reseed from a random input vector
            let random_idx = rng.random_range(0..vectors.len());
            *centroid = normalize_vector_copy(&vectors[random_idx]);
        } else {
            for value in centroid.iter_mut() {
                *value /= size as f32;
            }
            normalize_vector(centroid);
        }
    }

    new_centroids
}

/// Computes cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. If either vector has zero norm the
/// similarity is defined as 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Initializes centroids using the K-means++ algorithm.
///
/// When every remaining point coincides with a chosen centroid, the
/// remaining slots are filled with copies of the first centroid; those
/// clusters stay empty and are reseeded by the update step.
fn initialize_centroids_kmeans_plus_plus(
    vectors: &[Vec<f32>],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);

    let first_idx = rng.random_range(0..vectors.len());
    centroids.push(normalize_vector_copy(&vectors[first_idx]));

    while centroids.len() < k {
        let mut distances = vec![0.0f32; vectors.len()];
        let mut total_distance = 0.0f32;

        for (i, vector) in vectors.iter().enumerate() {
            let min_distance = centroids
                .iter()
                .map(|centroid| (1.0 - cosine_similarity(vector, centroid)).max(0.0))
                .fold(f32::MAX, f32::min);

            // Squared distance drives the K-means++ sampling distribution
            distances[i] = min_distance * min_distance;
            total_distance += distances[i];
        }

        if total_distance < EPSILON {
            let first = centroids[0].clone();
            centroids.resize(k, first);
            break;
        }

        let target = rng.random::<f32>() * total_distance;
        let mut cumulative = 0.0;
        // Fallback to the last positive-weight vector if rounding prevents selection
        let mut chosen = distances
            .iter()
            .rposition(|&d| d > 0.0)
            .unwrap_or(vectors.len() - 1);

        for (i, &distance) in distances.iter().enumerate() {
            cumulative += distance;
            if distance > 0.0 && cumulative >= target {
                chosen = i;
                break;
            }
        }

        centroids.push(normalize_vector_copy(&vectors[chosen]));
    }

    centroids
}

/// Calculates the mean cosine movement of centroids between iterations.
fn calculate_centroid_movement(old: &[Vec<f32>], new: &[Vec<f32>]) -> f32 {
    old.iter()
        .zip(new.iter())
        .map(|(old_c, new_c)| 1.0 - cosine_similarity(old_c, new_c))
        .sum::<f32>()
        / old.len() as f32
}

/// Normalizes a vector in-place to unit length.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Creates a normalized copy of a vector.
pub fn normalize_vector_copy(vector: &[f32]) -> Vec<f32> {
    let mut normalized = vector.to_vec();
    normalize_vector(&mut normalized);
    normalized
}
