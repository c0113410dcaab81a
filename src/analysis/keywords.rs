//! Keyword extraction from free-text records
//!
//! Turns collected text into normalized candidate keywords: lower-cased,
//! stripped of punctuation, filtered against a fixed stop-word list. No
//! stemming or lemmatization; candidates are ephemeral and recomputed per
//! analysis run.

use std::collections::HashMap;

use crate::models::RawRecord;

/// Common English function words excluded from keyword candidates
const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "was", "were", "been", "being", "have",
    "has", "had", "does", "did", "will", "would", "could", "should", "may",
    "might", "can", "this", "that", "these", "those", "you", "she", "they",
    "him", "her", "them", "your", "his", "its", "our", "their", "from", "into",
    "over", "under", "about", "after", "before", "what", "when", "where",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Tokenize text into candidate keywords.
///
/// Returns a lazy iterator over normalized tokens: lower-cased, non-alphanumeric
/// characters stripped, length > 3, not a stop word, not purely numeric.
/// Deterministic and pure; calling it twice on the same text yields the same
/// sequence.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|word| {
        let clean: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();

        if clean.len() > 3 && !is_stop_word(&clean) && !clean.chars().all(|c| c.is_ascii_digit()) {
            Some(clean)
        } else {
            None
        }
    })
}

/// Extract keyword candidates from every text field of every record
pub fn extract_keywords(records: &[RawRecord]) -> Vec<String> {
    let mut keywords = Vec::new();

    for record in records {
        for field in [
            &record.title,
            &record.description,
            &record.text,
            &record.search_term,
        ]
        .into_iter()
        .flatten()
        {
            keywords.extend(tokenize(field));
        }
    }

    keywords
}

/// Count keyword occurrences, returned sorted by descending frequency.
///
/// Ties break alphabetically so repeated runs over the same input produce a
/// stable ordering.
pub fn keyword_frequencies(records: &[RawRecord]) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for keyword in extract_keywords(records) {
        *counts.entry(keyword).or_insert(0) += 1;
    }

    let mut frequencies: Vec<(String, u64)> = counts.into_iter().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequencies
}
