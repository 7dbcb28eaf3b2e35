//! Runs against the real multilingual model. Downloads it on first use.
//!
//! Run with: cargo test --test integration_tests -- --ignored

use civitas::{
    ClusteringMethod, ComplaintClusteringService, ComplaintRecord, EmbeddingGenerator, Settings,
};

#[test]
#[ignore = "downloads the embedding model"]
fn test_multilingual_model_groups_hindi_and_english() {
    let service =
        ComplaintClusteringService::from_settings(&Settings::default()).expect("model loads");
    assert_eq!(service.generator().dimension().get(), 384);

    let batch = vec![
        ComplaintRecord::new(1, "No water supply", "Taps have been dry since Monday"),
        ComplaintRecord::new(2, "पानी नहीं आ रहा", "तीन दिन से पानी की सप्लाई बंद है"),
        ComplaintRecord::new(3, "Water pipeline broken", "Drinking water leaking on the street"),
        ComplaintRecord::new(4, "Huge pothole", "Pothole on the main road near the market"),
        ComplaintRecord::new(5, "सड़क टूटी हुई है", "मुख्य सड़क पर बड़े गड्ढे हैं"),
        ComplaintRecord::new(6, "Road damaged", "The road surface is broken after the rain"),
    ];

    let result = service
        .cluster(&batch, ClusteringMethod::KMeans, Some(2))
        .expect("clustering");
    println!("{}", serde_json::to_string_pretty(&result).unwrap());

    assert_eq!(result.total_clusters, 2);
    let water = result.cluster_of(batch[0].id);
    assert_eq!(result.cluster_of(batch[1].id), water);
    assert_eq!(result.cluster_of(batch[2].id), water);
    assert_ne!(result.cluster_of(batch[3].id), water);
}
