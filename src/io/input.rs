//! Loading complaint batches and similarity corpora from JSON files.
//!
//! A path of `-` reads from stdin.

use crate::io::exit_code::ExitCode;
use crate::types::{ClusteringResult, ComplaintRecord, CorpusEntry};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Invalid JSON in '{path}': {source}\nSuggestion: Expected an array of {{\"id\", \"title\", \"description\"}} objects"
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl InputError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            InputError::Read { .. } => ExitCode::IoError,
            InputError::Parse { .. } => ExitCode::InvalidInput,
        }
    }
}

/// Either a bare corpus or a saved clustering result.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Entries(Vec<CorpusEntry>),
    Result(ClusteringResult),
}

/// Read a JSON array of complaint records.
pub fn read_complaints(path: &Path) -> Result<Vec<ComplaintRecord>, InputError> {
    read_json(path)
}

/// Read a similarity corpus.
///
/// Accepts a JSON array of corpus entries or a saved clustering result, in
/// which case members carrying embeddings form the corpus.
pub fn read_corpus(path: &Path) -> Result<Vec<CorpusEntry>, InputError> {
    Ok(match read_json::<CorpusFile>(path)? {
        CorpusFile::Entries(entries) => entries,
        CorpusFile::Result(result) => result.similarity_corpus(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map(|_| buffer)
    } else {
        std::fs::read_to_string(path)
    }
    .map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
