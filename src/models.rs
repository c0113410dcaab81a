// Core data structures for trendsift

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of source platforms the system knows how to ingest.
///
/// Used to normalize cross-platform scores; a keyword seen on every known
/// platform saturates at 1.0.
pub const KNOWN_SOURCE_COUNT: usize = 6;

/// Data source platform enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    GoogleTrends,
    Reddit,
    Pinterest,
    Twitter,
    Amazon,
    Etsy,
}

impl Source {
    /// Get string representation (matches the persisted `platform` column)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleTrends => "google_trends",
            Self::Reddit => "reddit",
            Self::Pinterest => "pinterest",
            Self::Twitter => "twitter",
            Self::Amazon => "amazon",
            Self::Etsy => "etsy",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google_trends" | "google" => Some(Self::GoogleTrends),
            "reddit" => Some(Self::Reddit),
            "pinterest" => Some(Self::Pinterest),
            "twitter" => Some(Self::Twitter),
            "amazon" => Some(Self::Amazon),
            "etsy" => Some(Self::Etsy),
            _ => None,
        }
    }

    /// Get all known sources
    pub fn all() -> Vec<Self> {
        vec![
            Self::GoogleTrends,
            Self::Reddit,
            Self::Pinterest,
            Self::Twitter,
            Self::Amazon,
            Self::Etsy,
        ]
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for Source {}

/// One observation collected from a source platform.
///
/// Any subset of the free-text fields may be present; collectors fill in
/// whatever the platform exposes. Records are immutable once collected and
/// only consumed for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub source: Source,
    pub collected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl RawRecord {
    /// Create an empty record for a source with the given collection time
    pub fn new(source: Source, collected_at: DateTime<Utc>) -> Self {
        Self {
            source,
            collected_at,
            title: None,
            description: None,
            text: None,
            search_term: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Concatenated title + description + text, lower-cased.
    ///
    /// This is the haystack used for keyword mention checks. Search terms are
    /// deliberately excluded; they feed keyword extraction only.
    pub fn mention_text(&self) -> String {
        let mut text = String::new();
        for field in [&self.title, &self.description, &self.text]
            .into_iter()
            .flatten()
        {
            text.push_str(field);
            text.push(' ');
        }
        text.to_lowercase()
    }

    /// Check whether the record mentions a keyword (case-insensitive substring)
    pub fn mentions(&self, keyword_lower: &str) -> bool {
        self.mention_text().contains(keyword_lower)
    }
}

/// Per-keyword aggregate produced by one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendScore {
    pub keyword: String,
    pub frequency: u64,
    /// Composite score in [0, 1]
    pub score: f64,
    pub category: Option<String>,
    /// Platforms whose records mention the keyword
    pub sources: BTreeSet<Source>,
}

/// Growth of a keyword's popularity relative to its own history.
///
/// Brand-new keywords have no baseline to divide by; that case is a distinct
/// tagged value rather than a floating-point infinity, which does not survive
/// JSON serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GrowthRate {
    Rate(f64),
    Unbounded,
}

impl GrowthRate {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Numeric rate, if bounded
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Rate(r) => Some(*r),
            Self::Unbounded => None,
        }
    }
}

/// One trend observation for a `(keyword, platform)` pair.
///
/// This is the shape persisted to the history store and consumed by the
/// emerging trend detector. Popularity is on a 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRecord {
    pub keyword: String,
    pub category: Option<String>,
    pub platform: Source,
    pub popularity_score: f64,
    pub emerging_score: f64,
    pub confidence_score: f64,
    /// Growth relative to the historical baseline; None until detection ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth: Option<GrowthRate>,
    /// Number of distinct platforms corroborating the keyword
    #[serde(default)]
    pub source_count: usize,
    /// Corroborating platforms, sorted; filled by the confidence pass
    #[serde(default)]
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

impl TrendRecord {
    /// Create a record with zeroed detection fields
    pub fn new(
        keyword: impl Into<String>,
        platform: Source,
        popularity_score: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            category: None,
            platform,
            popularity_score,
            emerging_score: 0.0,
            confidence_score: 0.0,
            growth: None,
            source_count: 0,
            sources: Vec::new(),
            timestamp: Utc::now(),
            date,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Aggregate counts for one calendar date, upserted once per pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub total_trends: u64,
    /// Trends with emerging_score > 0.75
    pub emerging_trends: u64,
    /// Trends with confidence_score > 0.8
    pub high_confidence_trends: u64,
}

impl DailySnapshot {
    /// Compute snapshot counts from a day's trend set
    pub fn from_trends(date: NaiveDate, trends: &[TrendRecord]) -> Self {
        Self {
            date,
            total_trends: trends.len() as u64,
            emerging_trends: trends.iter().filter(|t| t.emerging_score > 0.75).count() as u64,
            high_confidence_trends: trends
                .iter()
                .filter(|t| t.confidence_score > 0.8)
                .count() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrip() {
        for source in Source::all() {
            assert_eq!(Source::parse(source.as_str()), Some(source));
        }
        assert_eq!(Source::parse("myspace"), None);
    }

    #[test]
    fn test_source_count_matches_enum() {
        assert_eq!(Source::all().len(), KNOWN_SOURCE_COUNT);
    }

    #[test]
    fn test_mention_text_skips_missing_fields() {
        let record = RawRecord::new(Source::Etsy, Utc::now())
            .with_title("Silver Necklace")
            .with_search_term("necklace");

        assert_eq!(record.mention_text(), "silver necklace ");
        assert!(record.mentions("silver"));
        assert!(!record.mentions("bracelet"));
    }

    #[test]
    fn test_growth_rate_serde_tagged() {
        let json = serde_json::to_string(&GrowthRate::Unbounded).unwrap();
        assert!(json.contains("unbounded"));

        let restored: GrowthRate = serde_json::from_str(&json).unwrap();
        assert!(restored.is_unbounded());

        let rate = GrowthRate::Rate(0.25);
        let json = serde_json::to_string(&rate).unwrap();
        let restored: GrowthRate = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.as_f64(), Some(0.25));
    }

    #[test]
    fn test_snapshot_counts() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut high = TrendRecord::new("necklace", Source::Etsy, 80.0, date);
        high.emerging_score = 0.9;
        high.confidence_score = 0.85;
        let low = TrendRecord::new("mug", Source::Amazon, 20.0, date);

        let snapshot = DailySnapshot::from_trends(date, &[high, low]);
        assert_eq!(snapshot.total_trends, 2);
        assert_eq!(snapshot.emerging_trends, 1);
        assert_eq!(snapshot.high_confidence_trends, 1);
    }
}
