//! Table formatting for clustering and similarity output.

use crate::types::{ClusteringResult, SimilarityMatch};
use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

/// Titles longer than this are shortened in tables.
const MAX_TITLE_CHARS: usize = 60;

/// Builder for the rounded UTF-8 tables used by every command.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Bold header row.
    pub fn set_headers(mut self, headers: &[&str]) -> Self {
        self.table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
        self
    }

    pub fn add_row(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn right(value: impl std::fmt::Display) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// One row per cluster: id, name, size, keywords.
pub fn create_cluster_table(result: &ClusteringResult) -> String {
    let mut builder =
        TableBuilder::new().set_headers(&["Cluster", "Name", "Complaints", "Keywords"]);

    for cluster in &result.clusters {
        builder = builder.add_row(vec![
            right(cluster.cluster_id),
            Cell::new(&cluster.name),
            right(cluster.count),
            Cell::new(cluster.keywords.join(", ")),
        ]);
    }

    if let Some(outliers) = result.outliers {
        builder = builder.add_row(vec![
            Cell::new("-"),
            Cell::new("Outliers").add_attribute(Attribute::Italic),
            right(outliers),
            Cell::new(""),
        ]);
    }

    builder.build()
}

/// Ranked similarity matches.
pub fn create_similarity_table(matches: &[SimilarityMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .fold(
            TableBuilder::new().set_headers(&["Rank", "Complaint", "Title", "Similarity"]),
            |builder, (rank, m)| {
                builder.add_row(vec![
                    right(rank + 1),
                    right(m.complaint_id),
                    Cell::new(shorten(&m.title, MAX_TITLE_CHARS)),
                    right(format!("{:.3}", m.similarity_score)),
                ])
            },
        )
        .build()
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cluster, ClusterId, ClusteringMethod, ComplaintId};

    #[test]
    fn test_cluster_table_lists_outliers() {
        let mut cluster = Cluster::new(ClusterId(0));
        cluster.name = "Road Problems".to_string();
        cluster.keywords = vec!["road".to_string(), "pothole".to_string()];
        cluster.count = 4;
        let result = ClusteringResult::new(ClusteringMethod::Topics, vec![cluster], 4, Some(2));

        let table = create_cluster_table(&result);
        assert!(table.contains("Road Problems"));
        assert!(table.contains("road, pothole"));
        assert!(table.contains("Outliers"));
        assert!(table.contains("Complaints"));
        assert!(table.contains('╭'));
    }

    #[test]
    fn test_similarity_table() {
        let matches = vec![SimilarityMatch {
            complaint_id: ComplaintId(42),
            title: "Streetlight not working".to_string(),
            similarity_score: 0.8765,
        }];
        let table = create_similarity_table(&matches);
        assert!(table.contains("42"));
        assert!(table.contains("0.877"));
        assert!(table.contains("Similarity"));
        assert!(table.contains('╰'));
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("पानी नहीं आ रहा", 5), "पानी…");
    }
}
