//! trendsift - Multi-source product trend detection
//!
//! Aggregates time-stamped popularity signals for keywords across several
//! external sources and turns them into a ranked, explainable list of
//! emerging product trends with a confidence level and category.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`collect`] - Collector trait and concurrent source fan-out
//! - [`analysis`] - Keyword extraction, classification, scoring, and
//!   emerging-trend detection
//! - [`storage`] - Trend history persistence (SQLite)
//! - [`pipeline`] - Orchestration of one daily/weekly analysis cycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trendsift::config::Config;
//! use trendsift::pipeline::TrendPipeline;
//! use trendsift::storage::HistoryStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let history = Arc::new(HistoryStore::new(&config.database.path)?);
//!     let pipeline = TrendPipeline::new(&config, history);
//!     let report = pipeline.run(&[], chrono::Utc::now().date_naive())?;
//!     println!("{} trends", report.total_trends);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod collect;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analysis::{CategoryClassifier, EmergingTrendDetector, ScoringEngine};
    pub use crate::collect::{Collector, CollectorManager};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        DailySnapshot, GrowthRate, RawRecord, Source, TrendRecord, TrendScore,
    };
    pub use crate::pipeline::{AnalysisReport, TrendPipeline};
    pub use crate::storage::HistoryStore;
}

// Direct re-exports for convenience
pub use models::{DailySnapshot, GrowthRate, RawRecord, Source, TrendRecord, TrendScore};
