//! Configuration module for the complaint clustering core.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CIVITAS_` and use double
//! underscores to separate nested levels:
//! - `CIVITAS_CLUSTERING__SEED=7` sets `clustering.seed`
//! - `CIVITAS_EMBEDDING__MODEL=MultilingualE5Small` sets `embedding.model`
//! - `CIVITAS_LOGGING__LEVEL=debug` sets `logging.level`

use crate::error::EmbeddingError;
use crate::topics::TopicModelParams;
use crate::types::ClusteringMethod;
use crate::vector::{GeneratorOptions, KMeansConfig, parse_embedding_model};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the configuration file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".civitas";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "CIVITAS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .civitas is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Centroid clustering settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Topic model settings
    #[serde(default)]
    pub topics: TopicsConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub similarity: SimilarityConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Max level for the stderr subscriber: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded models are cached (defaults to the user cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show the model download progress bar
    #[serde(default)]
    pub show_download_progress: bool,

    /// Inference batch size (model default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Cluster count when the caller does not pass one
    #[serde(default = "default_clusters")]
    pub default_clusters: usize,

    /// RNG seed for centroid initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Smallest batch a clustering request accepts
    #[serde(default = "default_min_complaints")]
    pub min_complaints: usize,

    #[serde(default)]
    pub default_method: ClusteringMethod,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TopicsConfig {
    /// Batches smaller than this skip topic discovery
    #[serde(default = "default_min_records")]
    pub min_records: usize,

    /// Cluster count used for batches below `min_records`
    #[serde(default = "default_small_batch_clusters")]
    pub small_batch_clusters: usize,

    #[serde(default = "default_min_topic_size")]
    pub min_topic_size: usize,

    #[serde(default = "default_top_n")]
    pub keywords_per_topic: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KeywordsConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimilarityConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_embedding_model() -> String {
    "ParaphraseMLMiniLML12V2".to_string()
}
fn default_clusters() -> usize {
    5
}
fn default_seed() -> u64 {
    crate::vector::clustering::DEFAULT_SEED
}
fn default_max_iterations() -> usize {
    crate::vector::clustering::DEFAULT_MAX_ITERATIONS
}
fn default_tolerance() -> f32 {
    crate::vector::clustering::DEFAULT_TOLERANCE
}
fn default_min_complaints() -> usize {
    3
}
fn default_min_records() -> usize {
    5
}
fn default_small_batch_clusters() -> usize {
    2
}
fn default_min_topic_size() -> usize {
    crate::topics::DEFAULT_MIN_TOPIC_SIZE
}
fn default_top_n() -> usize {
    crate::keywords::DEFAULT_TOP_N
}
fn default_top_k() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            logging: LoggingConfig::default(),
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
            topics: TopicsConfig::default(),
            keywords: KeywordsConfig::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: false,
            batch_size: None,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            default_clusters: default_clusters(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            min_complaints: default_min_complaints(),
            default_method: ClusteringMethod::default(),
        }
    }
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            min_records: default_min_records(),
            small_batch_clusters: default_small_batch_clusters(),
            min_topic_size: default_min_topic_size(),
            keywords_per_topic: default_top_n(),
        }
    }
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl EmbeddingConfig {
    /// Cache directory, falling back to `<user cache>/civitas/models`.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
                .join("civitas")
                .join("models")
        })
    }

    /// Model loading options for [`crate::vector::FastEmbedGenerator`].
    pub fn generator_options(&self) -> Result<GeneratorOptions, EmbeddingError> {
        Ok(GeneratorOptions {
            model: parse_embedding_model(&self.model)?,
            cache_dir: self.resolved_cache_dir(),
            show_download_progress: self.show_download_progress,
            batch_size: self.batch_size,
        })
    }
}

impl ClusteringConfig {
    pub fn kmeans_config(&self) -> KMeansConfig {
        KMeansConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            seed: self.seed,
        }
    }
}

impl TopicsConfig {
    pub fn model_params(&self) -> TopicModelParams {
        TopicModelParams {
            min_topic_size: self.min_topic_size,
            keywords_per_topic: self.keywords_per_topic,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let current = std::env::current_dir().unwrap_or_default();
        Self::load_in(&current)
    }

    /// Load configuration, discovering the workspace from `start`
    pub fn load_in(start: &Path) -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config(start)
            .unwrap_or_else(|| start.join(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root_from(start);
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores
            // stay inside field names.
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by walking up from `start`
    fn find_workspace_config(start: &Path) -> Option<PathBuf> {
        Self::workspace_root_from(start).map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .civitas is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::workspace_root_from(&current)
    }

    fn workspace_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let current = std::env::current_dir().map_err(|e| e.to_string())?;
        let config_path = Self::find_workspace_config(&current)
            .unwrap_or_else(|| current.join(CONFIG_DIR).join(CONFIG_FILE));
        Self::check_file(&config_path)
    }

    fn check_file(config_path: &Path) -> Result<(), String> {
        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'civitas init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments in the
    /// current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let current = std::env::current_dir()?;
        Self::init_config_file_in(&current, force)
    }

    /// Create a default settings file under `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let defaults = Settings::default();
        let template = format!(
            r#"# Civitas Configuration File

# Version of the configuration schema
version = 1

[logging]
# Max log level on stderr: error, warn, info, debug, trace
level = "{level}"

[embedding]
# Multilingual sentence model used for every embedding
# Options: ParaphraseMLMiniLML12V2, ParaphraseMLMiniLML12V2Q,
#          MultilingualE5Small, MultilingualE5Base, AllMiniLML6V2
model = "{model}"

# Model cache directory (defaults to the user cache directory)
# cache_dir = "{cache_dir}"

# Show a progress bar while the model downloads
show_download_progress = false

# Inference batch size (model default when unset)
# batch_size = 32

[clustering]
# Number of clusters when the request does not specify one
default_clusters = {clusters}

# Seed for centroid initialization; same seed and input give same clusters
seed = {seed}

max_iterations = {max_iterations}
tolerance = {tolerance:e}

# Requests with fewer complaints are rejected
min_complaints = {min_complaints}

# "kmeans" or "topics"
default_method = "kmeans"

[topics]
# Smaller batches are clustered with k-means instead
min_records = {min_records}

# Cluster count used for those small batches
small_batch_clusters = {small_batch}

# Minimum complaints per discovered topic
min_topic_size = {min_topic_size}

keywords_per_topic = {keywords_per_topic}

[keywords]
# Keywords extracted per cluster
top_n = {top_n}

[similarity]
# Matches returned by similarity search
top_k = {top_k}
"#,
            level = defaults.logging.level,
            model = defaults.embedding.model,
            cache_dir = defaults.embedding.resolved_cache_dir().display(),
            clusters = defaults.clustering.default_clusters,
            seed = defaults.clustering.seed,
            max_iterations = defaults.clustering.max_iterations,
            tolerance = defaults.clustering.tolerance,
            min_complaints = defaults.clustering.min_complaints,
            min_records = defaults.topics.min_records,
            small_batch = defaults.topics.small_batch_clusters,
            min_topic_size = defaults.topics.min_topic_size,
            keywords_per_topic = defaults.topics.keywords_per_topic,
            top_n = defaults.keywords.top_n,
            top_k = defaults.similarity.top_k,
        );

        std::fs::write(&config_path, template)?;
        tracing::info!(path = %config_path.display(), overwritten = force, "wrote configuration");

        Ok(config_path)
    }
}
