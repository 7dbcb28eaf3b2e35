//! Keyword extraction and cluster naming.
//!
//! Both are pure functions over text with no model dependency.

mod extractor;
mod namer;
mod stopwords;

pub use extractor::{DEFAULT_TOP_N, KeywordExtractor, tokenize};
pub use namer::{ClusterNamer, MISCELLANEOUS_LABEL};
pub use stopwords::is_stop_word;
