//! Topic discovery over complaint documents.
//!
//! [`TopicModel`] embeds documents, groups them with density clustering
//! (variable topic count, outliers allowed) and describes every topic with
//! its class-based TF-IDF terms.

mod ctfidf;
mod model;

pub use ctfidf::top_terms_per_topic;
pub use model::{
    DEFAULT_KEYWORDS_PER_TOPIC, DEFAULT_MIN_TOPIC_SIZE, TopicAssignments, TopicModel,
    TopicModelParams,
};
