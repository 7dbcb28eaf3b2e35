use civitas::error::EmbeddingResult;
use civitas::{ComplaintRecord, EmbeddingGenerator, EmbeddingVector, VectorDimension};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Deterministic stand-in for the sentence model.
///
/// Every civic theme owns two dimensions; a text activates the themes whose
/// vocabulary it contains. Texts sharing the same themes embed identically.
pub struct KeywordBagGenerator {
    dimension: VectorDimension,
}

impl KeywordBagGenerator {
    const THEMES: [&'static [&'static str]; 5] = [
        &["water", "pipe", "leak", "पानी"],
        &["road", "pothole", "सड़क"],
        &["garbage", "waste", "trash", "कचरा"],
        &["light", "lamp", "dark"],
        &["drain", "sewage", "flood"],
    ];

    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(12).expect("non-zero dimension"),
        }
    }
}

impl EmbeddingGenerator for KeywordBagGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<EmbeddingVector>> {
        let dim = self.dimension.get();
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut embedding = vec![0.01f32; dim];
                for (slot, words) in Self::THEMES.iter().enumerate() {
                    if words.iter().any(|w| lower.contains(w)) {
                        embedding[slot * 2] = 0.9;
                        embedding[slot * 2 + 1] = 0.7;
                    }
                }
                let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                embedding.iter_mut().for_each(|x| *x /= norm);
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Records numbered from 1 in slice order, no descriptions.
pub fn records(titles: &[&str]) -> Vec<ComplaintRecord> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| ComplaintRecord::new(i as u64 + 1, *title, ""))
        .collect()
}

pub mod sample_complaints {
    pub const WATER: [&str; 3] = ["Water pipe burst", "No water in taps", "Leaking water main"];

    pub const ROAD: [&str; 3] = [
        "Pothole on main road",
        "Road surface broken",
        "Road dug up and left",
    ];

    pub const GARBAGE: [&str; 3] = [
        "Garbage not collected",
        "Garbage piled at corner",
        "Garbage burning in open",
    ];

    /// Water, road and garbage complaints in that order.
    pub fn mixed_batch() -> Vec<&'static str> {
        WATER.iter().chain(&ROAD).chain(&GARBAGE).copied().collect()
    }

    pub const COMPLAINTS_JSON: &str = r#"[
  {"id": 101, "title": "Water pipe burst", "description": "Main line near the temple"},
  {"id": 102, "title": "Pothole on main road", "description": "Two-wheelers skidding"},
  {"id": 103, "title": "Garbage not collected", "description": "Bins overflowing for days"},
  {"id": 104, "title": "No water in taps"}
]"#;
}
