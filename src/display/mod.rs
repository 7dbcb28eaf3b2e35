//! Terminal display utilities for CLI output.
//!
//! Provides styled tables, spinners and themed status lines.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_spinner, with_spinner};
pub use tables::{TableBuilder, create_cluster_table, create_similarity_table};
pub use theme::{THEME, Theme};
