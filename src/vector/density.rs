//! Density-based hierarchical clustering (HDBSCAN) over embeddings.
//!
//! Discovers a variable number of clusters and marks points that do not
//! belong to any dense region as outliers. Geometry is cosine distance,
//! `1 - cos(a, b)`, the same metric the centroid path uses.
//!
//! # Algorithm
//! 1. Core distance of each point: distance to its `min_samples`-th
//!    nearest neighbour (the point itself counts as the first).
//! 2. Mutual reachability: `max(core(a), core(b), d(a, b))`.
//! 3. Minimum spanning tree over mutual reachability (Prim, O(n²)).
//! 4. Single-linkage tree from the MST edges in ascending weight.
//! 5. Condensed tree: splits that shed fewer than `min_cluster_size`
//!    points are treated as points falling out of the parent cluster.
//! 6. Excess-of-mass selection of non-overlapping clusters. The root is
//!    never selected, so a single homogeneous blob yields no clusters.
//!
//! Cluster labels are renumbered `0..` by descending size, ties broken by
//! the first point index that carries the label. Outliers get
//! [`OUTLIER_TOPIC`].

use crate::vector::clustering::cosine_similarity;
use std::collections::VecDeque;
use thiserror::Error;

/// Label assigned to points outside every selected cluster.
pub const OUTLIER_TOPIC: i32 = -1;

/// Default minimum number of points a cluster must keep.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

/// Distances below this are treated as this, keeping lambda finite.
const MIN_DISTANCE: f64 = 1e-12;

/// Errors from density clustering.
#[derive(Error, Debug)]
pub enum DensityError {
    #[error("Need at least {required} points for density clustering, got {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("Minimum cluster size must be at least 2, got {0}")]
    InvalidMinClusterSize(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            min_samples: DEFAULT_MIN_CLUSTER_SIZE,
        }
    }
}

impl DensityParams {
    /// Parameters with `min_samples` equal to `min_cluster_size`.
    pub fn with_min_cluster_size(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            min_samples: min_cluster_size,
        }
    }
}

/// Per-point labels and membership strengths.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityClustering {
    /// Cluster label per input point, or [`OUTLIER_TOPIC`].
    pub labels: Vec<i32>,
    /// Membership strength in `[0, 1]`; `0.0` for outliers.
    pub probabilities: Vec<f32>,
}

impl DensityClustering {
    pub fn cluster_count(&self) -> usize {
        self.labels
            .iter()
            .copied()
            .max()
            .map_or(0, |max| (max + 1).max(0) as usize)
    }

    pub fn outlier_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == OUTLIER_TOPIC).count()
    }
}

/// Run HDBSCAN over `vectors`.
pub fn density_clustering(
    vectors: &[Vec<f32>],
    params: &DensityParams,
) -> Result<DensityClustering, DensityError> {
    if params.min_cluster_size < 2 {
        return Err(DensityError::InvalidMinClusterSize(params.min_cluster_size));
    }

    let n = vectors.len();
    if n < params.min_cluster_size {
        return Err(DensityError::TooFewPoints {
            required: params.min_cluster_size,
            actual: n,
        });
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(DensityError::DimensionMismatch);
    }

    let distances = cosine_distance_matrix(vectors);
    let core = core_distances(&distances, params.min_samples.max(1));
    let mst = minimum_spanning_tree(&distances, &core);
    let linkage = Linkage::from_edges(n, mst);
    let condensed = condense_tree(&linkage, params.min_cluster_size);
    let selected = select_clusters(&condensed, n);
    let (labels, probabilities) = label_points(&condensed, &selected, n);

    let result = renumber_by_size(&labels, probabilities);
    tracing::debug!(
        points = n,
        clusters = result.cluster_count(),
        outliers = result.outlier_count(),
        "density clustering finished"
    );
    Ok(result)
}

fn cosine_distance_matrix(vectors: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut matrix = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (1.0 - f64::from(cosine_similarity(&vectors[i], &vectors[j]))).max(0.0);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

fn core_distances(distances: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    let n = distances.len();
    let k = (min_samples - 1).min(n - 1);
    distances
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(f64::total_cmp);
            sorted[k]
        })
        .collect()
}

/// Prim's algorithm over mutual reachability distances.
fn minimum_spanning_tree(distances: &[Vec<f64>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = distances.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[current] = true;

    for _ in 1..n {
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = distances[current][j].max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                from[j] = current;
            }
        }

        let Some(next) = (0..n)
            .filter(|&j| !in_tree[j])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
        else {
            break;
        };

        in_tree[next] = true;
        edges.push((from[next], next, best[next]));
        current = next;
    }

    edges
}

#[derive(Debug, Clone, Copy)]
struct LinkageNode {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

/// Single-linkage dendrogram. Ids `0..points` are leaves; internal node
/// `i` has id `points + i`.
#[derive(Debug)]
struct Linkage {
    points: usize,
    nodes: Vec<LinkageNode>,
}

impl Linkage {
    fn from_edges(points: usize, mut edges: Vec<(usize, usize, f64)>) -> Self {
        edges.sort_by(|a, b| a.2.total_cmp(&b.2));

        let total = 2 * points - 1;
        let mut parent: Vec<usize> = (0..total).collect();
        let mut sizes = vec![1usize; total];
        let mut nodes = Vec::with_capacity(points - 1);

        for (a, b, distance) in edges {
            let root_a = find_root(&mut parent, a);
            let root_b = find_root(&mut parent, b);
            let id = points + nodes.len();
            let size = sizes[root_a] + sizes[root_b];

            nodes.push(LinkageNode {
                left: root_a,
                right: root_b,
                distance,
                size,
            });
            parent[root_a] = id;
            parent[root_b] = id;
            sizes[id] = size;
        }

        Self { points, nodes }
    }

    fn root(&self) -> usize {
        self.points + self.nodes.len() - 1
    }

    fn size(&self, node: usize) -> usize {
        if node < self.points {
            1
        } else {
            self.nodes[node - self.points].size
        }
    }

    fn leaves(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current < self.points {
                leaves.push(current);
            } else {
                let inner = self.nodes[current - self.points];
                stack.push(inner.right);
                stack.push(inner.left);
            }
        }
        leaves
    }
}

fn find_root(parent: &mut [usize], mut node: usize) -> usize {
    let mut root = node;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

/// Edge of the condensed tree. `child < points` is a point falling out of
/// `parent`; otherwise `child` is a cluster label born from `parent`.
#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: usize,
    lambda: f64,
    size: usize,
}

fn condense_tree(linkage: &Linkage, min_cluster_size: usize) -> Vec<CondensedEdge> {
    let n = linkage.points;
    let root = linkage.root();
    let mut relabel = vec![0usize; root + 1];
    relabel[root] = n;
    let mut next_label = n + 1;
    let mut edges = Vec::new();

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if node < n {
            continue;
        }

        let inner = linkage.nodes[node - n];
        let lambda = 1.0 / inner.distance.max(MIN_DISTANCE);
        let parent = relabel[node];
        let left_size = linkage.size(inner.left);
        let right_size = linkage.size(inner.right);

        let fall_out = |child: usize, edges: &mut Vec<CondensedEdge>| {
            for leaf in linkage.leaves(child) {
                edges.push(CondensedEdge {
                    parent,
                    child: leaf,
                    lambda,
                    size: 1,
                });
            }
        };

        match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
            (true, true) => {
                for (child, size) in [(inner.left, left_size), (inner.right, right_size)] {
                    relabel[child] = next_label;
                    edges.push(CondensedEdge {
                        parent,
                        child: next_label,
                        lambda,
                        size,
                    });
                    next_label += 1;
                    queue.push_back(child);
                }
            }
            (false, false) => {
                fall_out(inner.left, &mut edges);
                fall_out(inner.right, &mut edges);
            }
            (true, false) => {
                relabel[inner.left] = parent;
                queue.push_back(inner.left);
                fall_out(inner.right, &mut edges);
            }
            (false, true) => {
                relabel[inner.right] = parent;
                queue.push_back(inner.right);
                fall_out(inner.left, &mut edges);
            }
        }
    }

    edges
}

/// Cluster hierarchy extracted from the condensed tree, indexed by
/// `label - points` so the root is index 0.
#[derive(Debug)]
struct SelectedClusters {
    parent: Vec<Option<usize>>,
    selected: Vec<bool>,
}

fn select_clusters(edges: &[CondensedEdge], n: usize) -> SelectedClusters {
    let count = edges
        .iter()
        .filter(|e| e.child >= n)
        .map(|e| e.child - n + 1)
        .max()
        .unwrap_or(1);

    let mut birth = vec![0.0f64; count];
    let mut parent = vec![None; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in edges.iter().filter(|e| e.child >= n) {
        birth[edge.child - n] = edge.lambda;
        parent[edge.child - n] = Some(edge.parent - n);
        children[edge.parent - n].push(edge.child - n);
    }

    let mut stability = vec![0.0f64; count];
    for edge in edges {
        let cluster = edge.parent - n;
        stability[cluster] += (edge.lambda - birth[cluster]) * edge.size as f64;
    }

    let mut selected = vec![true; count];
    selected[0] = false;

    // Children always carry larger labels than their parent.
    for cluster in (1..count).rev() {
        let subtree: f64 = children[cluster].iter().map(|&c| stability[c]).sum();
        if subtree > stability[cluster] {
            selected[cluster] = false;
            stability[cluster] = subtree;
        } else {
            let mut stack = children[cluster].clone();
            while let Some(descendant) = stack.pop() {
                selected[descendant] = false;
                stack.extend(&children[descendant]);
            }
        }
    }

    SelectedClusters { parent, selected }
}

fn label_points(
    edges: &[CondensedEdge],
    clusters: &SelectedClusters,
    n: usize,
) -> (Vec<Option<usize>>, Vec<f32>) {
    let mut point_cluster = vec![0usize; n];
    let mut point_lambda = vec![0.0f64; n];
    for edge in edges.iter().filter(|e| e.child < n) {
        point_cluster[edge.child] = edge.parent - n;
        point_lambda[edge.child] = edge.lambda;
    }

    let labels: Vec<Option<usize>> = point_cluster
        .iter()
        .map(|&start| {
            let mut current = Some(start);
            while let Some(cluster) = current {
                if clusters.selected[cluster] {
                    return Some(cluster);
                }
                current = clusters.parent[cluster];
            }
            None
        })
        .collect();

    let mut max_lambda = vec![0.0f64; clusters.selected.len()];
    for (label, &lambda) in labels.iter().zip(&point_lambda) {
        if let Some(cluster) = label {
            max_lambda[*cluster] = max_lambda[*cluster].max(lambda);
        }
    }

    let probabilities = labels
        .iter()
        .zip(&point_lambda)
        .map(|(label, &lambda)| match label {
            None => 0.0,
            Some(cluster) => {
                let max = max_lambda[*cluster];
                if max.is_finite() && max > 0.0 {
                    (lambda.min(max) / max) as f32
                } else {
                    1.0
                }
            }
        })
        .collect();

    (labels, probabilities)
}

fn renumber_by_size(labels: &[Option<usize>], probabilities: Vec<f32>) -> DensityClustering {
    // (label, size, first point index)
    let mut stats: Vec<(usize, usize, usize)> = Vec::new();
    for (index, label) in labels.iter().enumerate() {
        let Some(label) = label else { continue };
        match stats.iter_mut().find(|(l, _, _)| l == label) {
            Some(entry) => entry.1 += 1,
            None => stats.push((*label, 1, index)),
        }
    }
    stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let labels = labels
        .iter()
        .map(|label| match label {
            None => OUTLIER_TOPIC,
            Some(label) => stats
                .iter()
                .position(|(l, _, _)| l == label)
                .map_or(OUTLIER_TOPIC, |rank| rank as i32),
        })
        .collect();

    DensityClustering {
        labels,
        probabilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups_and_outlier() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.05, 0.0, 0.0],
            vec![1.0, 0.0, 0.05, 0.0],
            vec![1.0, 0.03, 0.03, 0.0],
            vec![0.05, 1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.05],
            vec![0.03, 1.0, 0.0, 0.03],
            vec![0.0, 0.0, 1.0, 0.05],
            vec![0.05, 0.0, 1.0, 0.0],
            vec![0.0, 0.03, 1.0, 0.03],
            vec![-1.0, -1.0, -1.0, 0.0],
        ]
    }

    #[test]
    fn test_finds_groups_and_outlier() {
        let result =
            density_clustering(&three_groups_and_outlier(), &DensityParams::default()).unwrap();

        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, OUTLIER_TOPIC]);
        assert_eq!(result.cluster_count(), 3);
        assert_eq!(result.outlier_count(), 1);
        assert_eq!(result.probabilities[9], 0.0);
        for p in &result.probabilities[..9] {
            assert!((0.0..=1.0).contains(p));
        }
        assert!(result.probabilities[..9].iter().any(|&p| p == 1.0));
    }

    #[test]
    fn test_labels_ordered_by_size() {
        let vectors = vec![
            vec![1.0, 0.05, 0.0],
            vec![1.0, 0.0, 0.05],
            vec![0.05, 1.0, 0.0],
            vec![0.0, 1.0, 0.05],
            vec![0.03, 1.0, 0.03],
            vec![0.04, 1.0, 0.01],
        ];
        let result = density_clustering(&vectors, &DensityParams::default()).unwrap();

        assert_eq!(result.labels, vec![1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_two_points_have_no_cluster() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = density_clustering(&vectors, &DensityParams::default()).unwrap();

        assert_eq!(result.cluster_count(), 0);
        assert_eq!(result.outlier_count(), 2);
    }

    #[test]
    fn test_invalid_input() {
        let params = DensityParams::default();
        assert!(matches!(
            density_clustering(&[vec![1.0]], &params),
            Err(DensityError::TooFewPoints {
                required: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            density_clustering(&[vec![1.0], vec![1.0, 0.0]], &params),
            Err(DensityError::DimensionMismatch)
        ));
        assert!(matches!(
            density_clustering(&[vec![1.0], vec![0.5]], &DensityParams::with_min_cluster_size(1)),
            Err(DensityError::InvalidMinClusterSize(1))
        ));
    }

    #[test]
    fn test_duplicate_points_keep_finite_probabilities() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];
        let result = density_clustering(&vectors, &DensityParams::default()).unwrap();

        assert_eq!(result.labels, vec![0, 0, 0, 1, 1]);
        assert!(result.probabilities.iter().all(|p| p.is_finite()));
    }
}
