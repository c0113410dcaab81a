//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use trendsift::models::{RawRecord, Source, TrendRecord};

/// A record mentioning `text`, collected `hours_ago` hours before now
pub fn record_at(source: Source, text: &str, hours_ago: i64) -> RawRecord {
    RawRecord::new(source, Utc::now() - Duration::hours(hours_ago)).with_title(text)
}

/// A batch that mentions one keyword repeatedly across two platforms, with
/// both fresh and day-old mentions so every scoring component is non-zero
pub fn two_platform_batch(keyword: &str) -> Vec<RawRecord> {
    vec![
        record_at(Source::Etsy, &format!("{keyword} necklace sale"), 1),
        record_at(Source::Etsy, &format!("best {keyword} designs"), 2),
        record_at(Source::Reddit, &format!("anyone selling {keyword} items"), 3),
        record_at(Source::Reddit, &format!("{keyword} inspiration thread"), 18),
    ]
}

pub fn trend(keyword: &str, platform: Source, popularity: f64, date: NaiveDate) -> TrendRecord {
    TrendRecord::new(keyword, platform, popularity, date)
}
