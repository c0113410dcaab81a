//! SQLite-backed trend history store
//!
//! Durable append-only `trends` table plus a one-row-per-date
//! `daily_snapshots` table, queryable by date range and prunable by
//! retention. Single-writer: the connection sits behind a `Mutex` and
//! concurrent pipeline runs must be serialized by the caller.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DailySnapshot, Source, TrendRecord};

/// Per-keyword aggregate over a multi-day window, grouped across platforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSourceTrend {
    pub keyword: String,
    pub source_count: usize,
    pub avg_popularity: f64,
    pub avg_emerging: f64,
    pub avg_confidence: f64,
    pub platforms: Vec<String>,
}

/// Snapshot counts plus platform breakdown for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_trends: u64,
    pub emerging_trends: u64,
    pub high_confidence_trends: u64,
    pub platform_breakdown: BTreeMap<String, u64>,
}

/// Store-wide statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_trends: u64,
    pub total_dates: u64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub platforms: BTreeMap<String, u64>,
}

/// SQLite-backed store for daily trend rows and snapshots
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "History store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS trends (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL,
                category TEXT,
                platform TEXT NOT NULL,
                popularity_score REAL,
                emerging_score REAL DEFAULT 0,
                confidence_score REAL DEFAULT 0,
                timestamp TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_trends_date ON trends(date);
            CREATE INDEX IF NOT EXISTS idx_trends_keyword ON trends(keyword);
            CREATE INDEX IF NOT EXISTS idx_trends_platform ON trends(platform);
            CREATE INDEX IF NOT EXISTS idx_trends_emerging ON trends(emerging_score);

            CREATE TABLE IF NOT EXISTS daily_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT UNIQUE NOT NULL,
                total_trends INTEGER DEFAULT 0,
                emerging_trends INTEGER DEFAULT 0,
                high_confidence_trends INTEGER DEFAULT 0,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .context("Failed to create history schema")?;

        Ok(())
    }

    /// Store a day's trends and upsert the snapshot row for that date.
    ///
    /// Trend rows are appended as-is: there is no uniqueness constraint on
    /// `(date, keyword, platform)`, so running the pipeline twice for the
    /// same date appends a second set of rows alongside the first. The
    /// snapshot row, by contrast, is replaced and always reflects the latest
    /// call. Deduplicating the trend table would change the meaning of
    /// range-query counts, so the append-only behavior is kept deliberately.
    pub fn store_daily_trends(&self, trends: &[TrendRecord], date: NaiveDate) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO trends (
                    keyword, category, platform, popularity_score,
                    emerging_score, confidence_score, timestamp, date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for trend in trends {
                stmt.execute(params![
                    trend.keyword,
                    trend.category,
                    trend.platform.as_str(),
                    trend.popularity_score,
                    trend.emerging_score,
                    trend.confidence_score,
                    trend.timestamp.to_rfc3339(),
                    date.to_string(),
                ])?;
            }
        }

        let snapshot = DailySnapshot::from_trends(date, trends);
        tx.execute(
            r#"
            INSERT OR REPLACE INTO daily_snapshots (
                date, total_trends, emerging_trends, high_confidence_trends
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                date.to_string(),
                snapshot.total_trends,
                snapshot.emerging_trends,
                snapshot.high_confidence_trends,
            ],
        )?;

        tx.commit().context("Failed to commit daily trends")?;

        tracing::info!(count = trends.len(), date = %date, "Stored daily trends");
        Ok(())
    }

    /// Trends for one date, ordered by emerging then popularity score
    pub fn get_trends_by_date(&self, date: NaiveDate) -> Result<Vec<TrendRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT keyword, category, platform, popularity_score,
                   emerging_score, confidence_score, timestamp, date
            FROM trends
            WHERE date = ?1
            ORDER BY emerging_score DESC, popularity_score DESC
            "#,
        )?;

        let trends = stmt
            .query_map(params![date.to_string()], row_to_trend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read trends by date")?;

        Ok(trends)
    }

    /// Trends over an inclusive date range, newest date first
    pub fn get_trends_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT keyword, category, platform, popularity_score,
                   emerging_score, confidence_score, timestamp, date
            FROM trends
            WHERE date BETWEEN ?1 AND ?2
            ORDER BY date DESC, emerging_score DESC
            "#,
        )?;

        let trends = stmt
            .query_map(params![start.to_string(), end.to_string()], row_to_trend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read trends by date range")?;

        Ok(trends)
    }

    /// Emerging trends from the last `days` days, filtered by minimum score
    pub fn get_emerging_trends(&self, days: i64, min_score: f64) -> Result<Vec<TrendRecord>> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(days);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT keyword, category, platform, popularity_score,
                   emerging_score, confidence_score, timestamp, date
            FROM trends
            WHERE date BETWEEN ?1 AND ?2 AND emerging_score >= ?3
            ORDER BY emerging_score DESC, popularity_score DESC
            "#,
        )?;

        let trends = stmt
            .query_map(
                params![start.to_string(), end.to_string(), min_score],
                row_to_trend,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read emerging trends")?;

        Ok(trends)
    }

    /// Keywords observed on at least `min_sources` distinct platforms within
    /// the window, with per-keyword averages
    pub fn get_multi_source_trends(
        &self,
        min_sources: usize,
        days: i64,
    ) -> Result<Vec<MultiSourceTrend>> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(days);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT keyword, COUNT(DISTINCT platform) as source_count,
                   AVG(popularity_score) as avg_popularity,
                   AVG(emerging_score) as avg_emerging,
                   AVG(confidence_score) as avg_confidence,
                   GROUP_CONCAT(DISTINCT platform) as platforms
            FROM trends
            WHERE date BETWEEN ?1 AND ?2
            GROUP BY keyword
            HAVING source_count >= ?3
            ORDER BY avg_emerging DESC, avg_popularity DESC
            "#,
        )?;

        let trends = stmt
            .query_map(
                params![start.to_string(), end.to_string(), min_sources as i64],
                |row| {
                    let platforms: String = row.get(5)?;
                    Ok(MultiSourceTrend {
                        keyword: row.get(0)?,
                        source_count: row.get::<_, i64>(1)? as usize,
                        avg_popularity: row.get(2)?,
                        avg_emerging: row.get(3)?,
                        avg_confidence: row.get(4)?,
                        platforms: platforms.split(',').map(String::from).collect(),
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read multi-source trends")?;

        Ok(trends)
    }

    /// Snapshot row for a date, if one was stored
    pub fn get_snapshot(&self, date: NaiveDate) -> Result<Option<DailySnapshot>> {
        let conn = self.conn.lock().unwrap();
        let snapshot = conn
            .query_row(
                r#"
                SELECT total_trends, emerging_trends, high_confidence_trends
                FROM daily_snapshots
                WHERE date = ?1
                "#,
                params![date.to_string()],
                |row| {
                    Ok(DailySnapshot {
                        date,
                        total_trends: row.get::<_, i64>(0)? as u64,
                        emerging_trends: row.get::<_, i64>(1)? as u64,
                        high_confidence_trends: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()
            .context("Failed to read snapshot")?;

        Ok(snapshot)
    }

    /// Daily summary: snapshot counts plus platform breakdown, zeroed when
    /// the date has no snapshot
    pub fn get_daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        let snapshot = self.get_snapshot(date)?;

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT platform, COUNT(*) FROM trends WHERE date = ?1 GROUP BY platform",
        )?;
        let platform_breakdown: BTreeMap<String, u64> = stmt
            .query_map(params![date.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<rusqlite::Result<_>>()
            .context("Failed to read platform breakdown")?;

        let snapshot = snapshot.unwrap_or(DailySnapshot {
            date,
            total_trends: 0,
            emerging_trends: 0,
            high_confidence_trends: 0,
        });

        Ok(DailySummary {
            date,
            total_trends: snapshot.total_trends,
            emerging_trends: snapshot.emerging_trends,
            high_confidence_trends: snapshot.high_confidence_trends,
            platform_breakdown,
        })
    }

    /// Delete trend and snapshot rows older than the retention window.
    ///
    /// Idempotent; returns `(trends_deleted, snapshots_deleted)`.
    pub fn cleanup_old_data(&self, retention_days: i64) -> Result<(usize, usize)> {
        let cutoff = Utc::now().date_naive() - Duration::days(retention_days);

        let conn = self.conn.lock().unwrap();
        let trends_deleted = conn.execute(
            "DELETE FROM trends WHERE date < ?1",
            params![cutoff.to_string()],
        )?;
        let snapshots_deleted = conn.execute(
            "DELETE FROM daily_snapshots WHERE date < ?1",
            params![cutoff.to_string()],
        )?;

        tracing::info!(
            trends = trends_deleted,
            snapshots = snapshots_deleted,
            cutoff = %cutoff,
            "Cleaned up old history data"
        );

        Ok((trends_deleted, snapshots_deleted))
    }

    /// Store-wide statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock().unwrap();

        let total_trends: i64 = conn.query_row("SELECT COUNT(*) FROM trends", [], |r| r.get(0))?;
        let total_dates: i64 =
            conn.query_row("SELECT COUNT(DISTINCT date) FROM trends", [], |r| r.get(0))?;

        let date_range: Option<(NaiveDate, NaiveDate)> = conn
            .query_row("SELECT MIN(date), MAX(date) FROM trends", [], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .optional()?
            .and_then(|(min, max)| match (min, max) {
                (Some(min), Some(max)) => {
                    match (min.parse::<NaiveDate>(), max.parse::<NaiveDate>()) {
                        (Ok(min), Ok(max)) => Some((min, max)),
                        _ => None,
                    }
                }
                _ => None,
            });

        let mut stmt = conn.prepare("SELECT platform, COUNT(*) FROM trends GROUP BY platform")?;
        let platforms: BTreeMap<String, u64> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<rusqlite::Result<_>>()?;

        Ok(StoreStats {
            total_trends: total_trends as u64,
            total_dates: total_dates as u64,
            date_range,
            platforms,
        })
    }
}

/// Map one trends-table row to a record; detection-only fields are zeroed
fn row_to_trend(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrendRecord> {
    let platform_text: String = row.get(2)?;
    let platform = Source::parse(&platform_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown platform '{platform_text}'").into(),
        )
    })?;

    let timestamp: String = row.get(6)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    let date: String = row.get(7)?;
    let date = date.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
    })?;

    Ok(TrendRecord {
        keyword: row.get(0)?,
        category: row.get(1)?,
        platform,
        popularity_score: row.get(3)?,
        emerging_score: row.get(4)?,
        confidence_score: row.get(5)?,
        growth: None,
        source_count: 0,
        sources: Vec::new(),
        timestamp,
        date,
    })
}
