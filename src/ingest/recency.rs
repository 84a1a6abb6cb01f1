// src/ingest/recency.rs
//! Freshness window. Items without a parseable date carry their fetch time,
//! so they always count as fresh.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;

use crate::ingest::types::NewsItem;

/// Longest accepted window (one year); `Duration::hours` panics far beyond this.
pub const MAX_WINDOW_HOURS: i64 = 24 * 365;

pub fn is_fresh(published_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(published_at) < window
}

/// Drop items older than `window_hours`. Returns (kept, dropped_count).
pub fn filter_recent(
    items: Vec<NewsItem>,
    now: DateTime<Utc>,
    window_hours: i64,
) -> (Vec<NewsItem>, usize) {
    let window = Duration::hours(window_hours.clamp(0, MAX_WINDOW_HOURS));
    let before = items.len();
    let kept: Vec<NewsItem> = items
        .into_iter()
        .filter(|it| is_fresh(it.published_at, now, window))
        .collect();
    let dropped = before - kept.len();
    counter!("digest_items_stale_total").increment(dropped as u64);
    (kept, dropped)
}
