//! End-to-end clustering runs through the service with a deterministic
//! generator, covering both methods and the caller-facing result shape.

use crate::common::{KeywordBagGenerator, records, sample_complaints};
use civitas::{
    ClusterId, ClusteringError, ClusteringMethod, ClusteringOptions, ClusteringResult,
    ComplaintClusteringService, ComplaintId,
};
use std::collections::HashSet;
use std::sync::Arc;

fn service() -> ComplaintClusteringService {
    ComplaintClusteringService::new(
        Arc::new(KeywordBagGenerator::new()),
        ClusteringOptions::default(),
    )
}

fn cluster_named<'a>(result: &'a ClusteringResult, name: &str) -> &'a civitas::Cluster {
    result
        .clusters
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no cluster named {name}: {result:#?}"))
}

fn member_titles(cluster: &civitas::Cluster) -> HashSet<&str> {
    cluster.members.iter().map(|m| m.title.as_str()).collect()
}

#[test]
fn test_kmeans_separates_civic_themes() {
    let batch = records(&sample_complaints::mixed_batch());
    let result = service()
        .cluster(&batch, ClusteringMethod::KMeans, Some(3))
        .expect("k-means run");

    assert_eq!(result.method, ClusteringMethod::KMeans);
    assert_eq!(result.total_clusters, 3);
    assert_eq!(result.total_complaints, 9);
    assert_eq!(result.outliers, None);
    assert_eq!(result.assigned_complaints(), 9);

    let water = cluster_named(&result, "Water Supply Issues");
    let road = cluster_named(&result, "Road Problems");
    let garbage = cluster_named(&result, "Waste Management");

    assert_eq!(member_titles(water), HashSet::from(sample_complaints::WATER));
    assert_eq!(member_titles(road), HashSet::from(sample_complaints::ROAD));
    assert_eq!(member_titles(garbage), HashSet::from(sample_complaints::GARBAGE));
    assert_eq!(water.keywords.first().map(String::as_str), Some("water"));

    // Raw group indices, every member carries its embedding.
    let ids: HashSet<ClusterId> = result.clusters.iter().map(|c| c.cluster_id).collect();
    assert!(ids.iter().all(|id| id.get() < 3));
    assert!(
        result
            .clusters
            .iter()
            .flat_map(|c| &c.members)
            .all(|m| m.embedding.as_ref().is_some_and(|e| e.len() == 12))
    );
}

#[test]
fn test_kmeans_reduces_oversized_cluster_request() {
    let batch = records(&[
        "Water pipe burst",
        "Pothole on main road",
        "Garbage not collected",
        "No water in taps",
    ]);
    let result = service()
        .cluster(&batch, ClusteringMethod::KMeans, Some(10))
        .expect("k-means run");

    // 4 records asking for 10 clusters use 4 / 2 = 2.
    assert_eq!(result.total_clusters, 2);
    assert_eq!(result.assigned_complaints(), 4);
}

#[test]
fn test_repeated_runs_are_identical() {
    let batch = records(&sample_complaints::mixed_batch());
    let service = service();

    let first = service.cluster(&batch, ClusteringMethod::KMeans, Some(3)).unwrap();
    let second = service.cluster(&batch, ClusteringMethod::KMeans, Some(3)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_topics_discover_three_themes() {
    let batch = records(&sample_complaints::mixed_batch());
    let result = service()
        .cluster(&batch, ClusteringMethod::Topics, None)
        .expect("topic run");

    assert_eq!(result.method, ClusteringMethod::Topics);
    assert_eq!(result.total_clusters, 3);
    assert_eq!(result.outliers, Some(0));
    assert_eq!(result.total_complaints, 9);

    // Equal sizes keep first-appearance order.
    let names: Vec<&str> = result.clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Water Supply Issues", "Road Problems", "Waste Management"]
    );
    let ids: Vec<u32> = result.clusters.iter().map(|c| c.cluster_id.get()).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    for cluster in &result.clusters {
        assert_eq!(cluster.count, 3);
        assert!(cluster.members.iter().all(|m| m.embedding.is_none()));
        assert!(
            cluster
                .members
                .iter()
                .all(|m| m.membership_score.is_some_and(|p| (0.0..=1.0).contains(&p)))
        );
    }
}

#[test]
fn test_topics_small_batch_uses_kmeans() {
    let batch = records(&["Water pipe burst", "Pothole on main road", "Garbage not collected"]);
    let result = service()
        .cluster(&batch, ClusteringMethod::Topics, None)
        .expect("small batch run");

    assert_eq!(result.method, ClusteringMethod::KMeans);
    assert_eq!(result.outliers, None);
    assert_eq!(result.assigned_complaints(), 3);
}

#[test]
fn test_rejects_tiny_batches() {
    let service = service();

    let err = service
        .cluster(&[], ClusteringMethod::KMeans, None)
        .unwrap_err();
    assert!(matches!(err, ClusteringError::EmptyInput));

    let batch = records(&["Water pipe burst", "No water in taps"]);
    let err = service
        .cluster(&batch, ClusteringMethod::Topics, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ClusteringError::NotEnoughComplaints {
            required: 3,
            actual: 2
        }
    ));
}

#[test]
fn test_result_feeds_storage_and_search() {
    let batch = records(&sample_complaints::mixed_batch());
    let service = service();
    let result = service
        .cluster(&batch, ClusteringMethod::KMeans, Some(3))
        .unwrap();

    let stored = result.stored_embeddings();
    assert_eq!(stored.len(), 9);
    for row in &stored {
        assert_eq!(result.cluster_of(row.complaint_id), Some(row.cluster_id));
        assert_eq!(row.embedding.len(), 12);
    }

    let assignments = result.assignments();
    let ids: Vec<ComplaintId> = assignments.iter().map(|(c, _)| *c).collect();
    assert_eq!(ids, (1..=9).map(ComplaintId::new).collect::<Vec<_>>());

    let corpus = result.similarity_corpus();
    let matches = service.find_similar("Water leaking from pipe", &corpus, 3);
    assert_eq!(matches.len(), 3);
    assert!(
        matches
            .iter()
            .all(|m| sample_complaints::WATER.contains(&m.title.as_str()))
    );
}
