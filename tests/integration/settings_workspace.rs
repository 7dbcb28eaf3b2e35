//! Settings discovery and initialization in an isolated workspace.

use crate::common::TestWorkspace;
use civitas::config::{CONFIG_DIR, CONFIG_FILE};
use civitas::{ClusteringMethod, ClusteringOptions, Settings};

#[test]
fn test_init_then_load_from_nested_directory() {
    let workspace = TestWorkspace::new();
    let path = Settings::init_config_file_in(workspace.path(), false).expect("init config");
    assert_eq!(path, workspace.path().join(CONFIG_DIR).join(CONFIG_FILE));

    // Second init without force refuses to overwrite.
    assert!(Settings::init_config_file_in(workspace.path(), false).is_err());
    assert!(Settings::init_config_file_in(workspace.path(), true).is_ok());

    let nested = workspace.path().join("wards").join("ward-12");
    std::fs::create_dir_all(&nested).expect("nested dir");

    let settings = Settings::load_in(&nested).expect("load from nested dir");
    assert_eq!(
        settings.workspace_root.as_deref(),
        Some(workspace.path())
    );
    assert_eq!(settings.clustering, Settings::default().clustering);
}

#[test]
fn test_custom_file_drives_service_options() {
    let workspace = TestWorkspace::new();
    let path = workspace.add_file(
        "custom.toml",
        r#"
[clustering]
default_clusters = 8
seed = 7
default_method = "bertopic"

[topics]
min_records = 20

[similarity]
top_k = 3
"#,
    );

    let settings = Settings::load_from(&path).expect("custom settings");
    assert_eq!(settings.clustering.default_method, ClusteringMethod::Topics);

    let options = ClusteringOptions::from_settings(&settings);
    assert_eq!(options.default_clusters, 8);
    assert_eq!(options.kmeans.seed, 7);
    assert_eq!(options.topic_min_records, 20);
    assert_eq!(options.similarity_top_k, 3);
    // Untouched sections keep their defaults.
    assert_eq!(options.min_complaints, 3);
    assert_eq!(options.small_batch_clusters, 2);
}
