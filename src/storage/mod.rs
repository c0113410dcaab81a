//! Persistence for daily trend history

pub mod history;

pub use history::{DailySummary, HistoryStore, MultiSourceTrend, StoreStats};
