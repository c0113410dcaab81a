//! Pipeline orchestrator
//!
//! Drives one analysis cycle: keyword extraction over the collected records,
//! classification and scoring per keyword, emerging detection against the
//! prior history window, confidence fusion, cross-platform clustering,
//! high-quality filtering, and persistence of the day's trend set and
//! snapshot.
//!
//! Two outcomes are deliberately distinct: a cycle over no data returns an
//! empty report (`Ok`), while a cycle that cannot persist what it computed
//! returns an error. Callers must treat an empty report as "no data today",
//! never as a failure, and an error as a failed cycle, never as quiet
//! success.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::emerging::{CrossPlatformTrend, EmergingTrendDetector, ProductSuggestion};
use crate::analysis::{keyword_frequencies, CategoryClassifier, ScoringEngine};
use crate::collect::CollectorManager;
use crate::config::Config;
use crate::error::Result;
use crate::models::{RawRecord, TrendRecord, TrendScore};
use crate::storage::HistoryStore;

/// Minimum confidence for the high-quality trend filter
const MIN_CONFIDENCE: f64 = 0.6;

/// Structured result of one analysis cycle, consumed read-only by reporting
/// and dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// When the analysis ran (ISO timestamp)
    pub analysis_date: DateTime<Utc>,

    /// Calendar date the cycle was attributed to
    pub date: NaiveDate,

    pub records_analyzed: usize,
    pub sources_analyzed: Vec<String>,

    /// Number of `(keyword, platform)` trend rows produced this cycle
    pub total_trends: usize,

    /// Top scored keywords, descending by composite score
    pub trending_keywords: Vec<TrendScore>,

    pub emerging_trends: Vec<TrendRecord>,
    pub cross_platform_trends: Vec<CrossPlatformTrend>,
    pub high_quality_trends: Vec<TrendRecord>,
    pub product_suggestions: Vec<ProductSuggestion>,

    pub platform_breakdown: BTreeMap<String, usize>,
    pub category_breakdown: BTreeMap<String, usize>,
}

impl AnalysisReport {
    /// The explicit no-data result: zero counts, empty lists, no error
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            analysis_date: Utc::now(),
            date,
            records_analyzed: 0,
            sources_analyzed: Vec::new(),
            total_trends: 0,
            trending_keywords: Vec::new(),
            emerging_trends: Vec::new(),
            cross_platform_trends: Vec::new(),
            high_quality_trends: Vec::new(),
            product_suggestions: Vec::new(),
            platform_breakdown: BTreeMap::new(),
            category_breakdown: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_trends == 0
    }
}

/// Wires extraction, classification, scoring, detection, and persistence
/// into one daily/weekly run
pub struct TrendPipeline {
    classifier: CategoryClassifier,
    scoring: ScoringEngine,
    detector: EmergingTrendDetector,
    history: Arc<HistoryStore>,
    max_trends: usize,
    min_score: f64,
}

impl TrendPipeline {
    pub fn new(config: &Config, history: Arc<HistoryStore>) -> Self {
        Self {
            classifier: CategoryClassifier::new(config.analysis.categories.clone()),
            scoring: ScoringEngine::new(config.analysis.scoring),
            detector: EmergingTrendDetector::new(config.detector),
            history,
            max_trends: config.analysis.max_trends,
            min_score: config.analysis.min_score,
        }
    }

    /// Collect from all registered sources, then analyze the batch.
    ///
    /// Collection is the only concurrent stage; everything downstream is
    /// sequential over in-memory collections.
    pub async fn run_cycle(
        &self,
        collectors: &CollectorManager,
        date: NaiveDate,
    ) -> Result<AnalysisReport> {
        let batch = collectors.collect_all().await;
        if !batch.failed_sources.is_empty() {
            tracing::warn!(
                failed = ?batch.failed_sources,
                "Some sources contributed no records this cycle"
            );
        }
        self.run(&batch.records, date)
    }

    /// Run one analysis cycle over an already-collected record pool.
    ///
    /// Empty input is not an error; it yields [`AnalysisReport::empty`]. A
    /// persistence failure is an error; the cycle never reports success with
    /// unpersisted results.
    pub fn run(&self, records: &[RawRecord], date: NaiveDate) -> Result<AnalysisReport> {
        tracing::info!(records = records.len(), date = %date, "Starting trend analysis");

        if records.is_empty() {
            tracing::warn!("No records available for analysis");
            return Ok(AnalysisReport::empty(date));
        }

        let now = Utc::now();

        // Extract and score the most frequent keywords
        let mut frequencies = keyword_frequencies(records);
        frequencies.truncate(self.max_trends);

        let mut trending_keywords: Vec<TrendScore> = frequencies
            .iter()
            .map(|(keyword, frequency)| TrendScore {
                keyword: keyword.clone(),
                frequency: *frequency,
                score: self
                    .scoring
                    .calculate_score_at(keyword, *frequency, records, now),
                category: self
                    .classifier
                    .classify_keyword(keyword)
                    .map(String::from),
                sources: self.scoring.keyword_sources(keyword, records),
            })
            .collect();
        // Keywords whose score failed or fell below the floor drop out here,
        // after every keyword in the batch had its chance to score
        trending_keywords.retain(|t| t.score >= self.min_score);
        trending_keywords.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        // Project per-(keyword, platform) trend rows on the 0-100 scale
        let mut current: Vec<TrendRecord> = Vec::new();
        for trend in &trending_keywords {
            for &platform in &trend.sources {
                current.push(
                    TrendRecord::new(&trend.keyword, platform, trend.score * 100.0, date)
                        .with_category(trend.category.clone()),
                );
            }
        }

        // Prior window for the delta comparison; a missing history is the
        // no-data condition, not a failure
        let historical = self.fetch_history(date);

        let detected = self.detector.detect_emerging_trends(&current, &historical);
        for emerging in &detected {
            if let Some(row) = current
                .iter_mut()
                .find(|t| t.keyword == emerging.keyword && t.platform == emerging.platform)
            {
                row.emerging_score = emerging.emerging_score;
                row.growth = emerging.growth;
            }
        }

        let current = self.detector.calculate_multi_source_confidence(current);

        let mut emerging_trends: Vec<TrendRecord> = current
            .iter()
            .filter(|t| t.growth.is_some())
            .cloned()
            .collect();
        emerging_trends.sort_by(|a, b| {
            b.emerging_score
                .total_cmp(&a.emerging_score)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        let cross_platform_trends = self
            .detector
            .detect_cross_platform_trends(&emerging_trends, self.detector.min_sources());
        let high_quality_trends =
            self.detector
                .filter_high_quality_trends(&emerging_trends, None, MIN_CONFIDENCE);
        let product_suggestions = self.detector.suggest_products(&emerging_trends);

        // Persist before reporting; a write failure fails the cycle
        self.history.store_daily_trends(&current, date)?;

        let report = AnalysisReport {
            analysis_date: now,
            date,
            records_analyzed: records.len(),
            sources_analyzed: record_sources(records),
            total_trends: current.len(),
            platform_breakdown: self.detector.platform_breakdown(&current),
            category_breakdown: self.detector.category_breakdown(&current),
            trending_keywords,
            emerging_trends,
            cross_platform_trends,
            high_quality_trends,
            product_suggestions,
        };

        tracing::info!(
            total = report.total_trends,
            emerging = report.emerging_trends.len(),
            "Trend analysis completed"
        );

        Ok(report)
    }

    fn fetch_history(&self, date: NaiveDate) -> Vec<TrendRecord> {
        let start = date - Duration::days(self.detector.lookback_days());
        let end = date - Duration::days(1);

        match self.history.get_trends_by_date_range(start, end) {
            Ok(trends) => trends,
            Err(e) => {
                tracing::warn!(error = %e, "No historical window available, treating all trends as new");
                Vec::new()
            }
        }
    }

}

fn record_sources(records: &[RawRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.source.to_string())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect()
}
