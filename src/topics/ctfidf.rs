//! Class-based TF-IDF term ranking.
//!
//! Each topic's documents are treated as one concatenated document. A term
//! scores `(tf / words_in_topic) * ln(1 + A / f)` where `A` is the mean word
//! count per topic and `f` the term's frequency over all topics.

use crate::keywords::tokenize;
use std::collections::HashMap;

/// Term counts for one topic, in first-seen order.
#[derive(Debug, Default)]
struct TopicTerms {
    terms: Vec<(String, usize)>,
    index: HashMap<String, usize>,
    total: usize,
}

impl TopicTerms {
    fn add(&mut self, token: String) {
        self.total += 1;
        match self.index.get(&token) {
            Some(&position) => self.terms[position].1 += 1,
            None => {
                self.index.insert(token.clone(), self.terms.len());
                self.terms.push((token, 1));
            }
        }
    }
}

/// Ranks the `top_n` terms of every topic.
///
/// `topics[c]` holds the documents of topic `c`. The output has one keyword
/// list per topic, best first; ties keep first-seen order.
pub fn top_terms_per_topic<S: AsRef<str>>(topics: &[Vec<S>], top_n: usize) -> Vec<Vec<String>> {
    let per_topic: Vec<TopicTerms> = topics
        .iter()
        .map(|documents| {
            let mut terms = TopicTerms::default();
            for document in documents {
                for token in tokenize(document.as_ref()) {
                    terms.add(token);
                }
            }
            terms
        })
        .collect();

    let mut corpus_frequency: HashMap<&str, usize> = HashMap::new();
    for topic in &per_topic {
        for (term, count) in &topic.terms {
            *corpus_frequency.entry(term.as_str()).or_default() += count;
        }
    }

    let total_words: usize = per_topic.iter().map(|t| t.total).sum();
    let average_words = if per_topic.is_empty() {
        0.0
    } else {
        total_words as f64 / per_topic.len() as f64
    };

    per_topic
        .iter()
        .map(|topic| {
            if topic.total == 0 {
                return Vec::new();
            }

            let mut scored: Vec<(&str, f64)> = topic
                .terms
                .iter()
                .map(|(term, count)| {
                    let tf = *count as f64 / topic.total as f64;
                    let frequency = corpus_frequency.get(term.as_str()).copied().unwrap_or(1);
                    let idf = (1.0 + average_words / frequency as f64).ln();
                    (term.as_str(), tf * idf)
                })
                .collect();

            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored
                .into_iter()
                .take(top_n)
                .map(|(term, _)| term.to_string())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_specific_terms_rank_first() {
        let topics = vec![
            vec![
                "Water pipe leaking near school",
                "Water supply cut near school",
            ],
            vec!["Garbage dumped near school", "Garbage not collected"],
        ];
        let keywords = top_terms_per_topic(&topics, 3);

        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0][0], "water");
        assert_eq!(keywords[1][0], "garbage");
        assert!(keywords.iter().all(|k| k.len() <= 3));
    }

    #[test]
    fn test_shared_terms_are_discounted() {
        let topics = vec![
            vec!["school school road"],
            vec!["school light"],
        ];
        let keywords = top_terms_per_topic(&topics, 2);

        // "school" is frequent in topic 0 but common to both topics.
        assert_eq!(keywords[1][0], "light");
    }

    #[test]
    fn test_empty_topic_has_no_terms() {
        let topics: Vec<Vec<&str>> = vec![vec!["a an"], vec!["drain blocked"]];
        let keywords = top_terms_per_topic(&topics, 5);

        assert!(keywords[0].is_empty());
        assert_eq!(keywords[1], vec!["drain", "blocked"]);
    }
}
