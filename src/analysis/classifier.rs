//! Product category classification
//!
//! Maps keywords and free text to product categories via marker sub-string
//! membership. Classification is first-match-wins over an ordered rule list,
//! so rule order is part of the configuration contract.

use std::collections::BTreeMap;

use crate::config::CategoryRule;

/// Classifies keywords and text into product categories
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    categories: Vec<CategoryRule>,
}

impl CategoryClassifier {
    pub fn new(categories: Vec<CategoryRule>) -> Self {
        Self { categories }
    }

    /// Classify a keyword into a product category.
    ///
    /// Returns the first category (in rule order) with a marker that is a
    /// substring of the lower-cased keyword, or None if nothing matches.
    pub fn classify_keyword(&self, keyword: &str) -> Option<&str> {
        let keyword_lower = keyword.to_lowercase();

        for rule in &self.categories {
            for marker in &rule.markers {
                if keyword_lower.contains(&marker.to_lowercase()) {
                    return Some(&rule.name);
                }
            }
        }

        None
    }

    /// Classify text into multiple categories with confidence scores.
    ///
    /// Each category scores `found_markers / total_markers`; categories with
    /// no markers present are omitted.
    pub fn classify_text(&self, text: &str) -> BTreeMap<String, f64> {
        let text_lower = text.to_lowercase();
        let mut scores = BTreeMap::new();

        for rule in &self.categories {
            if rule.markers.is_empty() {
                continue;
            }

            let found = rule
                .markers
                .iter()
                .filter(|marker| text_lower.contains(&marker.to_lowercase()))
                .count();

            if found > 0 {
                scores.insert(rule.name.clone(), found as f64 / rule.markers.len() as f64);
            }
        }

        scores
    }

    /// Get markers for a specific category
    pub fn category_markers(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|rule| rule.name == category)
            .map(|rule| rule.markers.as_slice())
    }

    /// Get all configured category names, in rule order
    pub fn all_categories(&self) -> Vec<&str> {
        self.categories.iter().map(|rule| rule.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jewelry_first() -> CategoryClassifier {
        CategoryClassifier::new(vec![
            CategoryRule::new("jewelry", &["necklace", "ring"]),
            CategoryRule::new("gifts", &["gift", "personalized"]),
        ])
    }

    #[test]
    fn test_classify_keyword_substring_match() {
        let classifier = jewelry_first();
        assert_eq!(classifier.classify_keyword("silver necklace set"), Some("jewelry"));
        assert_eq!(classifier.classify_keyword("EARRING display"), Some("jewelry"));
        assert_eq!(classifier.classify_keyword("wooden spoon"), None);
    }

    #[test]
    fn test_classify_keyword_first_match_wins() {
        let classifier = jewelry_first();
        // matches both "ring" (jewelry) and "personalized" (gifts);
        // jewelry comes first in rule order
        assert_eq!(
            classifier.classify_keyword("personalized ring"),
            Some("jewelry")
        );

        let reversed = CategoryClassifier::new(vec![
            CategoryRule::new("gifts", &["gift", "personalized"]),
            CategoryRule::new("jewelry", &["necklace", "ring"]),
        ]);
        assert_eq!(reversed.classify_keyword("personalized ring"), Some("gifts"));
    }

    #[test]
    fn test_classify_text_confidence() {
        let classifier = jewelry_first();
        let scores = classifier.classify_text("a necklace and a ring as a gift");

        assert_eq!(scores["jewelry"], 1.0); // 2 of 2 markers
        assert_eq!(scores["gifts"], 0.5); // 1 of 2 markers
    }

    #[test]
    fn test_classify_text_omits_zero_scores() {
        let classifier = jewelry_first();
        let scores = classifier.classify_text("wooden spoon");
        assert!(scores.is_empty());
    }

    #[test]
    fn test_category_markers_lookup() {
        let classifier = jewelry_first();
        assert_eq!(
            classifier.category_markers("jewelry"),
            Some(&["necklace".to_string(), "ring".to_string()][..])
        );
        assert!(classifier.category_markers("missing").is_none());
        assert_eq!(classifier.all_categories(), vec!["jewelry", "gifts"]);
    }
}
