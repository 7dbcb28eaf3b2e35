//! Fixed multilingual stop-word list.
//!
//! English and Hindi function words that carry no topic. Complaint
//! vocabulary ("near", "road", "issue") is deliberately absent.

const ENGLISH: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "from",
    "by", "is", "are", "was", "were", "be", "been", "has", "have", "had", "this", "that", "these",
    "those", "there", "their", "they", "them", "its", "not", "very", "also", "our", "your", "you",
    "all", "any", "into", "than", "then", "which", "who", "what", "when", "where", "will", "can",
    "please", "since",
];

const HINDI: &[&str] = &[
    "है", "हैं", "का", "की", "के", "में", "से", "को", "और", "हे", "ह", "पर", "भी", "नहीं", "यह",
    "वह", "था", "थी", "थे", "हो", "रहा", "रही", "रहे", "कर", "गया", "गई", "लिए", "एक", "तो",
    "ही", "बहुत",
];

/// Returns true when `token` (already lowercased) is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    ENGLISH.contains(&token) || HINDI.contains(&token)
}
