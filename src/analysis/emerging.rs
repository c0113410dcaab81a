//! Emerging trend detection
//!
//! Compares current against historical per-keyword popularity to flag trends
//! whose popularity is accelerating, fuses multi-source evidence into a
//! confidence score, clusters trends appearing across platforms, and derives
//! product-opportunity suggestions. The detector is stateless; every call
//! operates on the `(current, historical)` pair it is given, keyed by
//! `(keyword, platform)`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::DetectorConfig;
use crate::models::{GrowthRate, Source, TrendRecord};

/// Emerging score assigned to brand-new keywords validated by multi-source
/// appearance. Below the established ceiling of 1.0; novelty alone never
/// outranks measured acceleration.
const NEW_TREND_SCORE: f64 = 0.7;

/// Ceiling for the new-trend branch of the emerging score
const NEW_TREND_CAP: f64 = 0.8;

/// Aggregation of one keyword's trends across multiple platforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossPlatformTrend {
    pub keyword: String,
    pub platforms: Vec<Source>,
    pub source_count: usize,
    pub avg_popularity: f64,
    pub avg_emerging: f64,
    pub max_emerging: f64,
    pub confidence_score: f64,
    /// Member trends contributing to the aggregate
    pub trends: Vec<TrendRecord>,
}

/// Qualitative market-potential assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPotential {
    High,
    Medium,
    Low,
}

impl MarketPotential {
    /// Assess from the mean of emerging and confidence scores
    pub fn from_scores(emerging_score: f64, confidence_score: f64) -> Self {
        let combined = (emerging_score + confidence_score) / 2.0;
        if combined > 0.8 {
            Self::High
        } else if combined > 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for MarketPotential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// A product idea synthesized from an emerging trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSuggestion {
    pub keyword: String,
    pub emerging_score: f64,
    pub confidence_score: f64,
    pub category: Option<String>,
    pub suggested_title: String,
    pub suggested_tags: Vec<String>,
    pub market_potential: MarketPotential,
}

/// Detects emerging trends using delta analysis and multi-source validation
#[derive(Debug, Clone)]
pub struct EmergingTrendDetector {
    config: DetectorConfig,
}

impl Default for EmergingTrendDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl EmergingTrendDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn min_emerging_score(&self) -> f64 {
        self.config.min_emerging_score
    }

    pub fn lookback_days(&self) -> i64 {
        self.config.lookback_days
    }

    pub fn min_sources(&self) -> usize {
        self.config.min_sources
    }

    /// Calculate the emerging score for one popularity pair.
    ///
    /// With no prior popularity this is a new trend: `min(0.8, current/100)`,
    /// capped below the established ceiling to mark novelty. Otherwise
    /// `growth_rate * ln(current + 1)` clamped to `[0, 1]`, where
    /// `growth_rate = (current - previous) / (previous + 1)`.
    pub fn calculate_emerging_score(&self, current: f64, previous: f64) -> f64 {
        if previous <= 0.0 {
            if current > 0.0 {
                return NEW_TREND_CAP.min(current / 100.0);
            }
            return 0.0;
        }

        let growth_rate = (current - previous) / (previous + 1.0);
        let log_factor = (current + 1.0).ln();

        (growth_rate * log_factor).clamp(0.0, 1.0)
    }

    /// Detect emerging trends from a current batch and its historical window.
    ///
    /// Keys present in both windows are included when their emerging score
    /// meets the threshold. Keys absent from history are genuinely new and
    /// included when the keyword appears on at least `min_sources` platforms
    /// within the current batch, with a fixed score and unbounded growth.
    /// Result is sorted by descending emerging score.
    pub fn detect_emerging_trends(
        &self,
        current: &[TrendRecord],
        historical: &[TrendRecord],
    ) -> Vec<TrendRecord> {
        if current.is_empty() {
            return Vec::new();
        }

        // Last write wins per (keyword, platform), matching upstream upsert order
        let mut current_by_key: HashMap<(String, Source), TrendRecord> = HashMap::new();
        for trend in current {
            current_by_key.insert((trend.keyword.clone(), trend.platform), trend.clone());
        }

        let mut historical_popularity: HashMap<(String, Source), f64> = HashMap::new();
        for trend in historical {
            historical_popularity
                .insert((trend.keyword.clone(), trend.platform), trend.popularity_score);
        }

        let mut keyword_platforms: HashMap<&str, BTreeSet<Source>> = HashMap::new();
        for (keyword, platform) in current_by_key.keys() {
            keyword_platforms
                .entry(keyword.as_str())
                .or_default()
                .insert(*platform);
        }

        let mut emerging = Vec::new();

        for ((keyword, platform), trend) in &current_by_key {
            let mut candidate = trend.clone();

            match historical_popularity.get(&(keyword.clone(), *platform)) {
                Some(&previous) => {
                    let score =
                        self.calculate_emerging_score(candidate.popularity_score, previous);
                    if score >= self.config.min_emerging_score {
                        candidate.emerging_score = score;
                        candidate.growth = Some(GrowthRate::Rate(
                            (candidate.popularity_score - previous) / previous.max(1.0),
                        ));
                        emerging.push(candidate);
                    }
                }
                None => {
                    let platforms = keyword_platforms
                        .get(keyword.as_str())
                        .map(BTreeSet::len)
                        .unwrap_or(0);
                    if platforms >= self.config.min_sources {
                        candidate.emerging_score = NEW_TREND_SCORE;
                        candidate.growth = Some(GrowthRate::Unbounded);
                        emerging.push(candidate);
                    }
                }
            }
        }

        emerging.sort_by(|a, b| {
            b.emerging_score
                .total_cmp(&a.emerging_score)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        emerging
    }

    /// Fuse multi-source evidence into per-keyword confidence scores.
    ///
    /// Confidence is written back onto every trend sharing the keyword,
    /// together with the source count and the sorted contributing platforms.
    pub fn calculate_multi_source_confidence(
        &self,
        mut trends: Vec<TrendRecord>,
    ) -> Vec<TrendRecord> {
        let mut keyword_sources: HashMap<String, BTreeSet<Source>> = HashMap::new();
        let mut keyword_rows: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, trend) in trends.iter().enumerate() {
            keyword_sources
                .entry(trend.keyword.clone())
                .or_default()
                .insert(trend.platform);
            keyword_rows
                .entry(trend.keyword.clone())
                .or_default()
                .push(idx);
        }

        for (keyword, rows) in &keyword_rows {
            let sources = &keyword_sources[keyword];
            let source_count = sources.len();

            let base_confidence = (source_count as f64 / 4.0).min(1.0);
            let max_emerging = rows
                .iter()
                .map(|&i| trends[i].emerging_score)
                .fold(0.0f64, f64::max);
            let max_popularity = rows
                .iter()
                .map(|&i| trends[i].popularity_score)
                .fold(0.0f64, f64::max);

            let emerging_boost = max_emerging * 0.3;
            let popularity_boost = (max_popularity / 100.0).min(0.2);
            let confidence = (base_confidence + emerging_boost + popularity_boost).min(1.0);

            let platforms: Vec<Source> = sources.iter().copied().collect();
            for &idx in rows {
                trends[idx].confidence_score = confidence;
                trends[idx].source_count = source_count;
                trends[idx].sources = platforms.clone();
            }
        }

        trends
    }

    /// Cluster trends whose keyword spans at least `min_sources` entries.
    ///
    /// Sorted by `(confidence, max_emerging)` descending.
    pub fn detect_cross_platform_trends(
        &self,
        trends: &[TrendRecord],
        min_sources: usize,
    ) -> Vec<CrossPlatformTrend> {
        let mut by_keyword: BTreeMap<&str, Vec<&TrendRecord>> = BTreeMap::new();
        for trend in trends {
            by_keyword.entry(&trend.keyword).or_default().push(trend);
        }

        let mut clusters = Vec::new();

        for (keyword, group) in by_keyword {
            if group.len() < min_sources {
                continue;
            }

            let n = group.len() as f64;
            let avg_popularity = group.iter().map(|t| t.popularity_score).sum::<f64>() / n;
            let avg_emerging = group.iter().map(|t| t.emerging_score).sum::<f64>() / n;
            let max_emerging = group
                .iter()
                .map(|t| t.emerging_score)
                .fold(0.0f64, f64::max);

            clusters.push(CrossPlatformTrend {
                keyword: keyword.to_string(),
                platforms: group.iter().map(|t| t.platform).collect(),
                source_count: group.len(),
                avg_popularity,
                avg_emerging,
                max_emerging,
                confidence_score: (group.len() as f64 / 4.0 + max_emerging * 0.3).min(1.0),
                trends: group.into_iter().cloned().collect(),
            });
        }

        clusters.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then_with(|| b.max_emerging.total_cmp(&a.max_emerging))
        });

        clusters
    }

    /// Keep trends meeting both the emerging and confidence thresholds
    pub fn filter_high_quality_trends(
        &self,
        trends: &[TrendRecord],
        min_emerging_score: Option<f64>,
        min_confidence: f64,
    ) -> Vec<TrendRecord> {
        let min_emerging = min_emerging_score.unwrap_or(self.config.min_emerging_score);

        trends
            .iter()
            .filter(|t| t.emerging_score >= min_emerging && t.confidence_score >= min_confidence)
            .cloned()
            .collect()
    }

    /// Synthesize product suggestions for the top 20 trends, in the supplied
    /// ordering
    pub fn suggest_products(&self, trends: &[TrendRecord]) -> Vec<ProductSuggestion> {
        trends
            .iter()
            .take(20)
            .map(|trend| {
                let category = trend.category.as_deref().unwrap_or("general");
                ProductSuggestion {
                    keyword: trend.keyword.clone(),
                    emerging_score: trend.emerging_score,
                    confidence_score: trend.confidence_score,
                    category: trend.category.clone(),
                    suggested_title: format!(
                        "Personalized {} - Handmade Custom Design",
                        title_case(&trend.keyword)
                    ),
                    suggested_tags: suggested_tags(&trend.keyword, category),
                    market_potential: MarketPotential::from_scores(
                        trend.emerging_score,
                        trend.confidence_score,
                    ),
                }
            })
            .collect()
    }

    /// Trend counts per platform
    pub fn platform_breakdown(&self, trends: &[TrendRecord]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for trend in trends {
            *counts.entry(trend.platform.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Trend counts per category, with uncategorized trends bucketed
    pub fn category_breakdown(&self, trends: &[TrendRecord]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for trend in trends {
            let category = trend
                .category
                .clone()
                .unwrap_or_else(|| "uncategorized".to_string());
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }
}

/// Base plus category-specific tags, deduplicated, at most 10
fn suggested_tags(keyword: &str, category: &str) -> Vec<String> {
    let keyword_lower = keyword.to_lowercase();
    let category_lower = category.to_lowercase();

    let mut tags: Vec<String> = vec![
        keyword_lower,
        "handmade".to_string(),
        "personalized".to_string(),
        "custom".to_string(),
        category_lower.clone(),
        "etsy".to_string(),
        "trending".to_string(),
    ];

    let extras: &[&str] = match category_lower.as_str() {
        "jewelry" => &["necklace", "bracelet", "ring", "earrings"],
        "home_decor" => &["wall art", "home decor", "interior design"],
        "gifts" => &["gift", "present", "special occasion"],
        _ => &[],
    };
    tags.extend(extras.iter().map(|t| (*t).to_string()));

    let mut seen = BTreeSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    tags.truncate(10);
    tags
}

/// Upper-case the first letter of each whitespace-separated word
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn record(keyword: &str, platform: Source, popularity: f64) -> TrendRecord {
        TrendRecord::new(keyword, platform, popularity, date())
    }

    #[test]
    fn test_emerging_score_new_trend_branch() {
        let detector = EmergingTrendDetector::default();
        assert_eq!(detector.calculate_emerging_score(50.0, 0.0), 0.5);
        assert_eq!(detector.calculate_emerging_score(95.0, 0.0), 0.8); // capped
        assert_eq!(detector.calculate_emerging_score(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_emerging_score_growth_scenario() {
        // growth = (85-65)/(65+1) = 0.303..., ln(86) = 4.454...,
        // product 1.35 clamps to 1.0
        let detector = EmergingTrendDetector::default();
        let score = detector.calculate_emerging_score(85.0, 65.0);
        assert_eq!(score, 1.0);
        assert!(score >= detector.min_emerging_score());
    }

    #[test]
    fn test_emerging_score_decline_clamps_to_zero() {
        let detector = EmergingTrendDetector::default();
        assert_eq!(detector.calculate_emerging_score(10.0, 80.0), 0.0);
    }

    #[test]
    fn test_detect_known_keyword_requires_threshold() {
        let detector = EmergingTrendDetector::default();
        let current = vec![record("personalized jewelry", Source::GoogleTrends, 85.0)];
        let historical = vec![record("personalized jewelry", Source::GoogleTrends, 65.0)];

        let emerging = detector.detect_emerging_trends(&current, &historical);
        assert_eq!(emerging.len(), 1);
        assert_eq!(emerging[0].emerging_score, 1.0);
        let growth = emerging[0].growth.unwrap().as_f64().unwrap();
        assert!((growth - 20.0 / 65.0).abs() < 1e-9);

        // Flat popularity scores below the threshold
        let flat_current = vec![record("mug", Source::Etsy, 50.0)];
        let flat_history = vec![record("mug", Source::Etsy, 50.0)];
        assert!(detector
            .detect_emerging_trends(&flat_current, &flat_history)
            .is_empty());
    }

    #[test]
    fn test_detect_new_keyword_needs_multi_source() {
        let detector = EmergingTrendDetector::default();

        let single = vec![record("crochet octopus", Source::Etsy, 40.0)];
        assert!(detector.detect_emerging_trends(&single, &[]).is_empty());

        let multi = vec![
            record("crochet octopus", Source::Etsy, 40.0),
            record("crochet octopus", Source::Pinterest, 35.0),
        ];
        let emerging = detector.detect_emerging_trends(&multi, &[]);
        assert_eq!(emerging.len(), 2);
        for trend in &emerging {
            assert_eq!(trend.emerging_score, NEW_TREND_SCORE);
            assert!(trend.growth.unwrap().is_unbounded());
        }
    }

    #[test]
    fn test_detect_sorts_descending() {
        let detector = EmergingTrendDetector::default();
        let current = vec![
            record("necklace", Source::Etsy, 90.0),
            record("candle", Source::Etsy, 60.0),
            record("candle", Source::Amazon, 55.0),
        ];
        let historical = vec![record("necklace", Source::Etsy, 60.0)];

        let emerging = detector.detect_emerging_trends(&current, &historical);
        assert_eq!(emerging.len(), 3);
        assert_eq!(emerging[0].keyword, "necklace");
        assert!(emerging[0].emerging_score >= emerging[1].emerging_score);
        assert!(emerging[1].emerging_score >= emerging[2].emerging_score);
    }

    #[test]
    fn test_multi_source_confidence_written_to_group() {
        let detector = EmergingTrendDetector::default();
        let mut a = record("banner", Source::Etsy, 80.0);
        a.emerging_score = 0.9;
        let b = record("banner", Source::Reddit, 40.0);

        let trends = detector.calculate_multi_source_confidence(vec![a, b]);

        // base = 2/4 = 0.5, emerging boost = 0.9*0.3 = 0.27,
        // popularity boost = min(0.2, 80/100) = 0.2 -> 0.97
        for trend in &trends {
            assert!((trend.confidence_score - 0.97).abs() < 1e-9);
            assert_eq!(trend.source_count, 2);
            assert_eq!(trend.sources, vec![Source::Reddit, Source::Etsy]);
        }
    }

    #[test]
    fn test_cross_platform_min_sources_boundary() {
        let detector = EmergingTrendDetector::default();
        let trends = vec![
            record("sticker pack", Source::Etsy, 50.0),
            record("sticker pack", Source::Reddit, 45.0),
        ];

        let at_two = detector.detect_cross_platform_trends(&trends, 2);
        assert_eq!(at_two.len(), 1);
        assert_eq!(at_two[0].keyword, "sticker pack");
        assert_eq!(at_two[0].source_count, 2);
        assert!((at_two[0].avg_popularity - 47.5).abs() < 1e-9);

        let at_three = detector.detect_cross_platform_trends(&trends, 3);
        assert!(at_three.is_empty());
    }

    #[test]
    fn test_filter_high_quality_both_thresholds() {
        let detector = EmergingTrendDetector::default();
        let mut good = record("print", Source::Etsy, 70.0);
        good.emerging_score = 0.8;
        good.confidence_score = 0.7;
        let mut weak_confidence = record("mug", Source::Etsy, 70.0);
        weak_confidence.emerging_score = 0.9;
        weak_confidence.confidence_score = 0.4;
        let mut weak_emerging = record("card", Source::Etsy, 70.0);
        weak_emerging.emerging_score = 0.2;
        weak_emerging.confidence_score = 0.9;

        let kept =
            detector.filter_high_quality_trends(&[good, weak_confidence, weak_emerging], None, 0.6);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].keyword, "print");
    }

    #[test]
    fn test_suggestions_tags_and_potential() {
        let detector = EmergingTrendDetector::default();
        let mut trend = record("necklace", Source::Etsy, 85.0);
        trend.category = Some("jewelry".to_string());
        trend.emerging_score = 0.9;
        trend.confidence_score = 0.85;

        let suggestions = detector.suggest_products(&[trend]);
        assert_eq!(suggestions.len(), 1);
        let suggestion = &suggestions[0];

        assert_eq!(
            suggestion.suggested_title,
            "Personalized Necklace - Handmade Custom Design"
        );
        assert_eq!(suggestion.market_potential, MarketPotential::High);
        assert!(suggestion.suggested_tags.len() <= 10);
        assert!(suggestion.suggested_tags.contains(&"earrings".to_string()));
        // "necklace" is both the keyword and a jewelry extra; deduplicated
        let necklaces = suggestion
            .suggested_tags
            .iter()
            .filter(|t| *t == "necklace")
            .count();
        assert_eq!(necklaces, 1);
    }

    #[test]
    fn test_breakdowns() {
        let detector = EmergingTrendDetector::default();
        let mut a = record("necklace", Source::Etsy, 50.0);
        a.category = Some("jewelry".to_string());
        let b = record("lamp", Source::Etsy, 50.0);
        let c = record("poster", Source::Reddit, 50.0);

        let trends = vec![a, b, c];
        let platforms = detector.platform_breakdown(&trends);
        assert_eq!(platforms["etsy"], 2);
        assert_eq!(platforms["reddit"], 1);

        let categories = detector.category_breakdown(&trends);
        assert_eq!(categories["jewelry"], 1);
        assert_eq!(categories["uncategorized"], 2);
    }

    proptest! {
        #[test]
        fn prop_emerging_score_in_unit_interval(
            current in 0.0f64..1_000.0,
            previous in 0.0001f64..1_000.0,
        ) {
            let detector = EmergingTrendDetector::default();
            let score = detector.calculate_emerging_score(current, previous);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_new_trend_score_capped(current in 0.0f64..1_000.0) {
            let detector = EmergingTrendDetector::default();
            let score = detector.calculate_emerging_score(current, 0.0);
            let expected = if current > 0.0 {
                (current / 100.0).min(0.8)
            } else {
                0.0
            };
            prop_assert_eq!(score, expected);
        }
    }
}
