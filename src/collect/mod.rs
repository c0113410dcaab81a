//! Source collection fan-out
//!
//! The [`Collector`] trait is the seam between this crate and the scrapers
//! that actually talk to platforms; network collectors live outside this
//! crate. The manager queries all registered collectors concurrently and
//! isolates per-source failures: a failed source contributes an empty record
//! set and a logged error, never a batch failure. An unconfigured collector
//! reports itself unavailable rather than fabricating data.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{RawRecord, Source};

/// Errors produced by a single collector
#[derive(Debug, Error)]
pub enum CollectError {
    /// The collector is not configured (missing credentials, disabled)
    #[error("source {source} unavailable: {reason}")]
    Unavailable { source: Source, reason: String },

    /// The collector ran and failed
    #[error("source {source} failed: {reason}")]
    Failed { source: Source, reason: String },
}

impl CollectError {
    pub fn source(&self) -> Source {
        match self {
            Self::Unavailable { source, .. } | Self::Failed { source, .. } => *source,
        }
    }

    /// Transient failures are worth retrying next cycle; a missing
    /// configuration is not
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A data source capable of producing raw records
#[async_trait]
pub trait Collector: Send + Sync {
    /// The platform this collector observes
    fn source(&self) -> Source;

    /// Gather one batch of records
    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError>;
}

/// Collector serving a preloaded record set (tests, replays, fixtures)
pub struct StaticCollector {
    source: Source,
    records: Vec<RawRecord>,
}

impl StaticCollector {
    pub fn new(source: Source, records: Vec<RawRecord>) -> Self {
        Self { source, records }
    }
}

#[async_trait]
impl Collector for StaticCollector {
    fn source(&self) -> Source {
        self.source
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        Ok(self.records.clone())
    }
}

/// Placeholder for a source without working configuration.
///
/// Always reports unavailable; never produces fabricated records.
pub struct UnconfiguredCollector {
    source: Source,
    reason: String,
}

impl UnconfiguredCollector {
    pub fn new(source: Source, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Collector for UnconfiguredCollector {
    fn source(&self) -> Source {
        self.source
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        Err(CollectError::Unavailable {
            source: self.source,
            reason: self.reason.clone(),
        })
    }
}

/// Result of one collection fan-out
#[derive(Debug, Default, Serialize)]
pub struct CollectionBatch {
    /// All records gathered across sources, in registration order
    pub records: Vec<RawRecord>,

    /// Records contributed per source
    pub source_counts: BTreeMap<String, usize>,

    /// Sources that failed or were unavailable this cycle
    pub failed_sources: Vec<String>,
}

impl CollectionBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Queries all registered collectors concurrently and joins their results
#[derive(Default)]
pub struct CollectorManager {
    collectors: Vec<Box<dyn Collector>>,
}

impl CollectorManager {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
        }
    }

    pub fn register(&mut self, collector: Box<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Collect from every source concurrently.
    ///
    /// Failures are gathered individually; one hung or failing source cannot
    /// abort the sources that already completed.
    pub async fn collect_all(&self) -> CollectionBatch {
        let futures = self.collectors.iter().map(|collector| async move {
            let source = collector.source();
            (source, collector.collect().await)
        });

        let results = join_all(futures).await;

        let mut batch = CollectionBatch::default();
        for (source, result) in results {
            match result {
                Ok(records) => {
                    tracing::info!(source = %source, count = records.len(), "Collected records");
                    batch
                        .source_counts
                        .insert(source.to_string(), records.len());
                    batch.records.extend(records);
                }
                Err(e) => {
                    tracing::error!(source = %source, error = %e, "Collection failed");
                    batch.source_counts.insert(source.to_string(), 0);
                    batch.failed_sources.push(source.to_string());
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(source: Source, title: &str) -> RawRecord {
        RawRecord::new(source, Utc::now()).with_title(title)
    }

    #[tokio::test]
    async fn test_fan_out_merges_all_sources() {
        let mut manager = CollectorManager::new();
        manager.register(Box::new(StaticCollector::new(
            Source::Etsy,
            vec![record(Source::Etsy, "necklace"), record(Source::Etsy, "mug")],
        )));
        manager.register(Box::new(StaticCollector::new(
            Source::Reddit,
            vec![record(Source::Reddit, "necklace")],
        )));

        let batch = manager.collect_all().await;
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.source_counts["etsy"], 2);
        assert_eq!(batch.source_counts["reddit"], 1);
        assert!(batch.failed_sources.is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_is_isolated() {
        let mut manager = CollectorManager::new();
        manager.register(Box::new(StaticCollector::new(
            Source::Etsy,
            vec![record(Source::Etsy, "candle")],
        )));
        manager.register(Box::new(UnconfiguredCollector::new(
            Source::Twitter,
            "no bearer token",
        )));

        let batch = manager.collect_all().await;
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.source_counts["twitter"], 0);
        assert_eq!(batch.failed_sources, vec!["twitter".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_manager_yields_empty_batch() {
        let manager = CollectorManager::new();
        let batch = manager.collect_all().await;
        assert!(batch.is_empty());
    }
}
