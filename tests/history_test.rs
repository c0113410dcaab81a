//! History store tests against an on-disk database

mod common;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use trendsift::models::Source;
use trendsift::storage::HistoryStore;

fn temp_store() -> (TempDir, HistoryStore) {
    let dir = TempDir::new().unwrap();
    let store = HistoryStore::new(dir.path().join("history.db")).unwrap();
    (dir, store)
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");
    let date = Utc::now().date_naive();

    {
        let store = HistoryStore::new(&path).unwrap();
        let mut trend = common::trend("ceramic", Source::Etsy, 80.0, date);
        trend.emerging_score = 0.9;
        store.store_daily_trends(&[trend], date).unwrap();
    }

    let reopened = HistoryStore::new(&path).unwrap();
    let trends = reopened.get_trends_by_date(date).unwrap();
    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].keyword, "ceramic");
    assert!((trends[0].emerging_score - 0.9).abs() < 1e-9);

    let snapshot = reopened.get_snapshot(date).unwrap().unwrap();
    assert_eq!(snapshot.total_trends, 1);
    assert_eq!(snapshot.emerging_trends, 1);
}

#[test]
fn test_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("history.db");

    let store = HistoryStore::new(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store.stats().unwrap().total_trends, 0);
}

#[test]
fn test_multi_source_window_on_disk() {
    let (_dir, store) = temp_store();
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    store
        .store_daily_trends(
            &[
                common::trend("ceramic", Source::Etsy, 60.0, today),
                common::trend("lamp", Source::Etsy, 70.0, today),
            ],
            today,
        )
        .unwrap();
    store
        .store_daily_trends(
            &[common::trend("ceramic", Source::Reddit, 40.0, yesterday)],
            yesterday,
        )
        .unwrap();

    // Corroboration counts across the whole window, not a single day
    let multi = store.get_multi_source_trends(2, 7).unwrap();
    assert_eq!(multi.len(), 1);
    assert_eq!(multi[0].keyword, "ceramic");
    assert_eq!(multi[0].source_count, 2);
    assert!((multi[0].avg_popularity - 50.0).abs() < 1e-9);
}

#[test]
fn test_daily_summary_combines_snapshot_and_breakdown() {
    let (_dir, store) = temp_store();
    let date = Utc::now().date_naive();

    let mut emerging = common::trend("ceramic", Source::Etsy, 90.0, date);
    emerging.emerging_score = 0.9;
    emerging.confidence_score = 0.85;
    store
        .store_daily_trends(
            &[
                emerging,
                common::trend("lamp", Source::Etsy, 30.0, date),
                common::trend("poster", Source::Reddit, 20.0, date),
            ],
            date,
        )
        .unwrap();

    let summary = store.get_daily_summary(date).unwrap();
    assert_eq!(summary.total_trends, 3);
    assert_eq!(summary.emerging_trends, 1);
    assert_eq!(summary.high_confidence_trends, 1);
    assert_eq!(summary.platform_breakdown["etsy"], 2);
    assert_eq!(summary.platform_breakdown["reddit"], 1);
}

#[test]
fn test_cleanup_on_disk_and_stats_reflect_it() {
    let (_dir, store) = temp_store();
    let today = Utc::now().date_naive();
    let stale = today - Duration::days(45);

    store
        .store_daily_trends(&[common::trend("old", Source::Etsy, 50.0, stale)], stale)
        .unwrap();
    store
        .store_daily_trends(&[common::trend("new", Source::Etsy, 50.0, today)], today)
        .unwrap();

    assert_eq!(store.stats().unwrap().total_dates, 2);

    let (trends_deleted, snapshots_deleted) = store.cleanup_old_data(30).unwrap();
    assert_eq!(trends_deleted, 1);
    assert_eq!(snapshots_deleted, 1);

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_trends, 1);
    assert_eq!(stats.total_dates, 1);
    assert_eq!(stats.date_range, Some((today, today)));
}
