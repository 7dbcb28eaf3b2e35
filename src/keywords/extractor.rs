//! Frequency-ranked keyword extraction.

use super::stopwords::is_stop_word;
use std::collections::HashMap;

/// Number of keywords returned when the caller has no preference.
pub const DEFAULT_TOP_N: usize = 5;

/// Tokens must be longer than this, counted in characters.
const MIN_TOKEN_CHARS: usize = 2;

/// Extracts the most frequent salient words from a group of texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordExtractor {
    top_n: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl KeywordExtractor {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Top keywords across all `texts`, most frequent first.
    ///
    /// Ties keep the order in which the words were first seen.
    pub fn extract<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for token in tokenize(text.as_ref()) {
                match index.get(&token) {
                    Some(&position) => counts[position].1 += 1,
                    None => {
                        index.insert(token.clone(), counts.len());
                        counts.push((token, 1));
                    }
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(self.top_n)
            .map(|(word, _)| word)
            .collect()
    }
}

/// Lowercase, strip punctuation, split on whitespace, and drop short
/// tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|&c| keeps_char(c))
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

fn keeps_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_combining_mark(c)
}

/// Combining marks that must survive punctuation stripping, mainly
/// Devanagari vowel signs and virama.
fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{0900}'..='\u{0903}'
            | '\u{093A}'..='\u{094F}'
            | '\u{0951}'..='\u{0957}'
            | '\u{0962}'..='\u{0963}'
    )
}
