//! Human-readable cluster labels from keyword lists.

/// Label for a cluster without keywords.
pub const MISCELLANEOUS_LABEL: &str = "Miscellaneous Issues";

/// Suffix appended to a capitalized keyword when no curated label matches.
const FALLBACK_SUFFIX: &str = " Related Issues";

/// Curated keyword labels, checked in keyword order.
const CURATED_LABELS: &[(&str, &str)] = &[
    ("water", "Water Supply Issues"),
    ("road", "Road Problems"),
    ("electricity", "Power Supply Issues"),
    ("garbage", "Waste Management"),
    ("drainage", "Drainage Problems"),
    ("street", "Street Issues"),
    ("light", "Street Lighting"),
    ("sanitation", "Sanitation Issues"),
];

/// Maps keyword lists to cluster names.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClusterNamer;

impl ClusterNamer {
    pub fn new() -> Self {
        Self
    }

    /// Name a cluster from its keywords, most salient first.
    ///
    /// The first keyword with a curated label wins. Otherwise the first
    /// keyword is capitalized and suffixed with `" Related Issues"`.
    pub fn name<S: AsRef<str>>(&self, keywords: &[S]) -> String {
        let Some(first) = keywords.first() else {
            return MISCELLANEOUS_LABEL.to_string();
        };

        keywords
            .iter()
            .find_map(|keyword| curated_label(keyword.as_ref()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{FALLBACK_SUFFIX}", capitalize(first.as_ref())))
    }
}

fn curated_label(keyword: &str) -> Option<&'static str> {
    CURATED_LABELS
        .iter()
        .find(|(key, _)| *key == keyword)
        .map(|(_, label)| *label)
}

/// First character uppercase, the rest lowercase.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
