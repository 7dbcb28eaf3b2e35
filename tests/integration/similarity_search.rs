//! Similarity search over corpora loaded from disk.

use crate::common::{KeywordBagGenerator, TestWorkspace, records, sample_complaints};
use civitas::io::{InputError, read_complaints, read_corpus};
use civitas::search::{DEFAULT_TOP_K, rank_by_similarity, try_find_similar};
use civitas::{
    ClusteringMethod, ClusteringOptions, ComplaintClusteringService, ComplaintId, CorpusEntry,
    SearchError,
};
use std::sync::Arc;

#[test]
fn test_complaint_batch_from_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.add_file("complaints.json", sample_complaints::COMPLAINTS_JSON);

    let batch = read_complaints(&path).expect("valid batch");
    assert_eq!(batch.len(), 4);
    assert_eq!(batch[0].id, ComplaintId::new(101));
    assert_eq!(batch[0].document(), "Water pipe burst. Main line near the temple");
    // Missing description defaults to empty.
    assert_eq!(batch[3].description, "");
}

#[test]
fn test_malformed_batch_is_invalid_input() {
    let workspace = TestWorkspace::new();
    let path = workspace.add_file("broken.json", r#"[{"title": "no id"}]"#);

    let err = read_complaints(&path).unwrap_err();
    assert!(matches!(err, InputError::Parse { .. }));
    assert_eq!(err.exit_code() as u8, 4);

    let missing = workspace.path().join("missing.json");
    let err = read_complaints(&missing).unwrap_err();
    assert!(matches!(err, InputError::Read { .. }));
}

#[test]
fn test_saved_result_serves_as_corpus() {
    let workspace = TestWorkspace::new();
    let service = ComplaintClusteringService::new(
        Arc::new(KeywordBagGenerator::new()),
        ClusteringOptions::default(),
    );
    let result = service
        .cluster(
            &records(&sample_complaints::mixed_batch()),
            ClusteringMethod::KMeans,
            Some(3),
        )
        .unwrap();

    let saved = serde_json::to_string_pretty(&result).unwrap();
    let path = workspace.add_file("result.json", &saved);

    let corpus = read_corpus(&path).expect("saved result");
    assert_eq!(corpus.len(), 9);

    let matches = service
        .try_find_similar("Pothole near the bus stop", &corpus, DEFAULT_TOP_K)
        .unwrap();
    assert_eq!(matches.len(), DEFAULT_TOP_K);
    let top: Vec<&str> = matches[..3].iter().map(|m| m.title.as_str()).collect();
    assert!(top.iter().all(|t| sample_complaints::ROAD.contains(t)));
    assert!(
        matches
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score)
    );
}

#[test]
fn test_corpus_entries_without_embeddings_are_skipped() {
    let workspace = TestWorkspace::new();
    let path = workspace.add_file(
        "corpus.json",
        r#"[
  {"id": 1, "title": "Water pipe burst", "embedding": [1.0, 0.0]},
  {"id": 2, "title": "Not embedded yet"},
  {"id": 3, "title": "Road surface broken", "embedding": [0.0, 1.0]},
  {"id": 4, "title": "Old model", "embedding": [1.0, 0.0, 0.0]}
]"#,
    );

    let corpus = read_corpus(&path).expect("corpus entries");
    assert_eq!(corpus.len(), 4);

    let matches = rank_by_similarity(&[0.8, 0.6], &corpus, 10);
    let ids: Vec<u64> = matches.iter().map(|m| m.complaint_id.get()).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!((matches[0].similarity_score - 0.8).abs() < 1e-5);
}

#[test]
fn test_blank_query_is_rejected() {
    let generator = KeywordBagGenerator::new();
    let corpus = vec![CorpusEntry {
        id: ComplaintId::new(1),
        title: "Water pipe burst".to_string(),
        embedding: Some(vec![0.1; 12]),
    }];

    let err = try_find_similar(&generator, "   ", &corpus, 5).unwrap_err();
    assert!(matches!(err, SearchError::EmptyQuery));

    let matches = try_find_similar(&generator, "Water pipe burst", &corpus, 0).unwrap();
    assert!(matches.is_empty());
}
