//! Trend analysis: keyword extraction, classification, scoring, and
//! emerging-trend detection

pub mod classifier;
pub mod emerging;
pub mod keywords;
pub mod scoring;

pub use classifier::CategoryClassifier;
pub use emerging::{CrossPlatformTrend, EmergingTrendDetector, MarketPotential, ProductSuggestion};
pub use keywords::{extract_keywords, keyword_frequencies, tokenize};
pub use scoring::{frequency_score, ScoreBreakdown, ScoringEngine};
