//! Configuration management for trendsift
//!
//! This module handles loading and validating configuration from a TOML file
//! and environment variables. There is no ambient global config object;
//! components receive the slice of configuration they need at construction.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Analysis configuration (categories, scoring weights)
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Emerging trend detector thresholds
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path for the trend history store
    pub path: PathBuf,

    /// Days of trend history to retain before pruning
    pub retention_days: i64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/trends_history.db"),
            retention_days: 30,
        }
    }
}

/// One product category and its marker sub-strings.
///
/// Categories are kept as an ordered list, not a map: classification is
/// first-match-wins, so iteration order is significant and must be stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub markers: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: impl Into<String>, markers: &[&str]) -> Self {
        Self {
            name: name.into(),
            markers: markers.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

/// Weights for the four scoring factors.
///
/// The weights need not sum to 1; the composite score is capped at 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub frequency: f64,
    pub recency: f64,
    pub growth: f64,
    pub cross_platform: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            frequency: 0.3,
            recency: 0.3,
            growth: 0.2,
            cross_platform: 0.2,
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Ordered category-to-markers rules
    pub categories: Vec<CategoryRule>,

    /// Scoring factor weights
    pub scoring: ScoringWeights,

    /// Minimum composite score for a keyword to be kept at all
    pub min_score: f64,

    /// Maximum number of scored keywords carried into detection
    pub max_trends: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            scoring: ScoringWeights::default(),
            min_score: 0.1,
            max_trends: 50,
        }
    }
}

/// Emerging trend detector thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum emerging score for a known keyword to count as emerging
    pub min_emerging_score: f64,

    /// Minimum growth rate threshold
    pub min_growth_rate: f64,

    /// Minimum distinct platforms for multi-source validation
    pub min_sources: usize,

    /// Days of history fetched for the comparison window
    pub lookback_days: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_emerging_score: 0.75,
            min_growth_rate: 0.2,
            min_sources: 2,
            lookback_days: 7,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Stock category map carried when no config file overrides it
fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("home_decor", &["home decor", "wall art", "candle", "mug", "pillow"]),
        CategoryRule::new("jewelry", &["necklace", "ring", "bracelet", "earrings", "jewelry"]),
        CategoryRule::new("gifts", &["gift", "personalized", "custom", "unique"]),
        CategoryRule::new("pets", &["pet", "dog", "cat", "animal"]),
        CategoryRule::new("wellness", &["soap", "candle", "beauty", "skincare"]),
        CategoryRule::new("digital", &["digital", "printable", "download"]),
        CategoryRule::new("vintage", &["vintage", "retro", "antique"]),
        CategoryRule::new("crafts", &["craft", "diy", "handmade"]),
    ]
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TRENDSIFT_DB_PATH") {
            config.database.path = PathBuf::from(path);
        }
        if let Some(days) = env_parse::<i64>("TRENDSIFT_RETENTION_DAYS") {
            config.database.retention_days = days;
        }
        if let Some(score) = env_parse::<f64>("TRENDSIFT_MIN_EMERGING_SCORE") {
            config.detector.min_emerging_score = score;
        }
        if let Some(sources) = env_parse::<usize>("TRENDSIFT_MIN_SOURCES") {
            config.detector.min_sources = sources;
        }
        if let Some(days) = env_parse::<i64>("TRENDSIFT_LOOKBACK_DAYS") {
            config.detector.lookback_days = days;
        }
        if let Ok(level) = std::env::var("TRENDSIFT_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let weights = &self.analysis.scoring;
        for (name, value) in [
            ("frequency", weights.frequency),
            ("recency", weights.recency),
            ("growth", weights.growth),
            ("cross_platform", weights.cross_platform),
        ] {
            if value < 0.0 {
                anyhow::bail!("scoring weight '{name}' must be non-negative");
            }
        }

        if !(0.0..=1.0).contains(&self.detector.min_emerging_score) {
            anyhow::bail!("min_emerging_score must be within [0, 1]");
        }

        if self.detector.min_sources == 0 {
            anyhow::bail!("min_sources must be greater than 0");
        }

        if self.detector.lookback_days <= 0 {
            anyhow::bail!("lookback_days must be greater than 0");
        }

        if self.database.retention_days <= 0 {
            anyhow::bail!("retention_days must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            analysis: AnalysisConfig::default(),
            detector: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}
