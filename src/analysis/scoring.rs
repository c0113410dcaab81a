//! Trend scoring engine
//!
//! Computes a composite 0-1 score per keyword from four factors: raw
//! frequency, recency of mentions, short-term growth, and cross-platform
//! presence. A failure scoring one keyword yields 0.0 for that keyword and
//! never aborts the rest of the batch.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ScoringWeights;
use crate::models::{RawRecord, Source, KNOWN_SOURCE_COUNT};

/// Per-factor score breakdown for one keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub frequency_score: f64,
    pub recency_score: f64,
    pub growth_score: f64,
    pub cross_platform_score: f64,
    pub final_score: f64,
}

/// Calculates composite trend scores using weighted factors
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Calculate the composite score for a keyword over a record pool.
    ///
    /// Returns a value in [0, 1]. Scoring failures are logged and yield 0.0
    /// for this keyword only.
    pub fn calculate_score(&self, keyword: &str, frequency: u64, records: &[RawRecord]) -> f64 {
        self.calculate_score_at(keyword, frequency, records, Utc::now())
    }

    /// Same as [`calculate_score`](Self::calculate_score) with an explicit
    /// reference time for the recency/growth windows
    pub fn calculate_score_at(
        &self,
        keyword: &str,
        frequency: u64,
        records: &[RawRecord],
        now: DateTime<Utc>,
    ) -> f64 {
        match self.try_score(keyword, frequency, records, now) {
            Ok(score) => score,
            Err(e) => {
                tracing::error!(keyword = %keyword, error = %e, "Scoring failed, assigning 0.0");
                0.0
            }
        }
    }

    /// Per-factor breakdown, useful for report explanations
    pub fn score_breakdown(
        &self,
        keyword: &str,
        frequency: u64,
        records: &[RawRecord],
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let keyword_lower = keyword.to_lowercase();
        ScoreBreakdown {
            frequency_score: frequency_score(frequency),
            recency_score: recency_score(&keyword_lower, records, now),
            growth_score: growth_score(&keyword_lower, records, now),
            cross_platform_score: cross_platform_score(&keyword_lower, records),
            final_score: self.calculate_score_at(keyword, frequency, records, now),
        }
    }

    /// Distinct platforms whose records mention the keyword
    pub fn keyword_sources(&self, keyword: &str, records: &[RawRecord]) -> BTreeSet<Source> {
        let keyword_lower = keyword.to_lowercase();
        records
            .iter()
            .filter(|r| r.mentions(&keyword_lower))
            .map(|r| r.source)
            .collect()
    }

    fn try_score(
        &self,
        keyword: &str,
        frequency: u64,
        records: &[RawRecord],
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let keyword_lower = keyword.to_lowercase();

        let score = frequency_score(frequency) * self.weights.frequency
            + recency_score(&keyword_lower, records, now) * self.weights.recency
            + growth_score(&keyword_lower, records, now) * self.weights.growth
            + cross_platform_score(&keyword_lower, records) * self.weights.cross_platform;

        if !score.is_finite() {
            anyhow::bail!("composite score is not finite (weights: {:?})", self.weights);
        }

        Ok(score.min(1.0))
    }
}

/// Frequency factor: linear ramp saturating at 100 occurrences
pub fn frequency_score(frequency: u64) -> f64 {
    frequency.min(100) as f64 / 100.0
}

/// Recency factor: fraction of mentions collected within the last 24 hours.
/// Zero mentions score 0.
fn recency_score(keyword_lower: &str, records: &[RawRecord], now: DateTime<Utc>) -> f64 {
    let mut recent = 0u64;
    let mut total = 0u64;

    for record in records {
        if !record.mentions(keyword_lower) {
            continue;
        }
        total += 1;
        if now - record.collected_at < Duration::hours(24) {
            recent += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        recent as f64 / total as f64
    }
}

/// Growth factor: mentions in the last 12 hours vs. mentions 12-24 hours ago.
///
/// With no older mentions there is no baseline, which scores a neutral 0.5.
/// Otherwise the growth rate maps linearly onto [0, 1] between -0.5 and 1.0.
fn growth_score(keyword_lower: &str, records: &[RawRecord], now: DateTime<Utc>) -> f64 {
    let mut recent = 0i64;
    let mut older = 0i64;

    for record in records {
        if !record.mentions(keyword_lower) {
            continue;
        }
        let age = now - record.collected_at;
        if age < Duration::hours(12) {
            recent += 1;
        } else if age < Duration::hours(24) {
            older += 1;
        }
    }

    if older == 0 {
        return 0.5;
    }

    let growth_rate = (recent - older) as f64 / older.max(1) as f64;

    if growth_rate >= 1.0 {
        1.0
    } else if growth_rate <= -0.5 {
        0.0
    } else {
        (growth_rate + 0.5) / 1.5
    }
}

/// Cross-platform factor: distinct mentioning sources over the known total
fn cross_platform_score(keyword_lower: &str, records: &[RawRecord]) -> f64 {
    let platforms: BTreeSet<Source> = records
        .iter()
        .filter(|r| r.mentions(keyword_lower))
        .map(|r| r.source)
        .collect();

    (platforms.len().min(KNOWN_SOURCE_COUNT) as f64) / KNOWN_SOURCE_COUNT as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record_at(source: Source, hours_ago: i64, text: &str, now: DateTime<Utc>) -> RawRecord {
        RawRecord::new(source, now - Duration::hours(hours_ago)).with_text(text)
    }

    #[test]
    fn test_frequency_score_clamps() {
        assert_eq!(frequency_score(0), 0.0);
        assert_eq!(frequency_score(50), 0.5);
        assert_eq!(frequency_score(100), 1.0);
        assert_eq!(frequency_score(150), 1.0);
    }

    #[test]
    fn test_recency_score_fraction_of_recent_mentions() {
        let now = Utc::now();
        let records = vec![
            record_at(Source::Etsy, 2, "ceramic mug sale", now),
            record_at(Source::Etsy, 30, "ceramic mug vintage", now),
        ];

        assert_eq!(recency_score("ceramic", &records, now), 0.5);
        assert_eq!(recency_score("absent", &records, now), 0.0);
    }

    #[test]
    fn test_growth_score_neutral_without_baseline() {
        let now = Utc::now();
        let records = vec![record_at(Source::Reddit, 2, "resin keychain", now)];
        assert_eq!(growth_score("resin", &records, now), 0.5);
    }

    #[test]
    fn test_growth_score_doubling_saturates() {
        let now = Utc::now();
        let records = vec![
            record_at(Source::Reddit, 1, "resin art", now),
            record_at(Source::Reddit, 2, "resin art", now),
            record_at(Source::Reddit, 3, "resin art", now),
            record_at(Source::Reddit, 18, "resin art", now),
        ];
        // recent=3, older=1, growth=(3-1)/1=2.0 -> saturates at 1.0
        assert_eq!(growth_score("resin", &records, now), 1.0);
    }

    #[test]
    fn test_growth_score_decline_floors() {
        let now = Utc::now();
        let records = vec![
            record_at(Source::Reddit, 15, "fidget toy", now),
            record_at(Source::Reddit, 18, "fidget toy", now),
        ];
        // recent=0, older=2, growth=-1.0 -> floors at 0.0
        assert_eq!(growth_score("fidget", &records, now), 0.0);
    }

    #[test]
    fn test_cross_platform_score_counts_distinct_sources() {
        let now = Utc::now();
        let records = vec![
            record_at(Source::Etsy, 1, "macrame wall hanging", now),
            record_at(Source::Etsy, 2, "macrame plant holder", now),
            record_at(Source::Pinterest, 1, "macrame diy", now),
            record_at(Source::Reddit, 1, "macrame cord", now),
        ];
        assert!((cross_platform_score("macrame", &records) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_score_capped_at_one() {
        let heavy = ScoringWeights {
            frequency: 2.0,
            recency: 2.0,
            growth: 2.0,
            cross_platform: 2.0,
        };
        let engine = ScoringEngine::new(heavy);
        let now = Utc::now();
        let records = vec![record_at(Source::Etsy, 1, "candle holder", now)];

        let score = engine.calculate_score_at("candle", 200, &records, now);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_bad_weights_isolated_to_zero() {
        let broken = ScoringWeights {
            frequency: f64::NAN,
            recency: 0.3,
            growth: 0.2,
            cross_platform: 0.2,
        };
        let engine = ScoringEngine::new(broken);
        let score = engine.calculate_score("anything", 10, &[]);
        assert_eq!(score, 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_in_unit_interval(frequency in 0u64..10_000) {
            let engine = ScoringEngine::new(ScoringWeights::default());
            let score = engine.calculate_score_at("keyword", frequency, &[], Utc::now());
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_frequency_score_matches_clamp(frequency in 0u64..1_000) {
            let expected = frequency.min(100) as f64 / 100.0;
            prop_assert_eq!(frequency_score(frequency), expected);
        }
    }
}
