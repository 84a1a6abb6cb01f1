// src/ingest/mod.rs
pub mod providers;
pub mod recency;
pub mod types;

use crate::ingest::types::{NewsItem, SourceProvider};
use crate::telemetry::ensure_metrics_described;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

pub const ELLIPSIS: &str = "...";

/// Decode entities, strip tags, fold quotes and whitespace. No length cap.
pub fn strip_html(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Plain-text summary capped at `budget` chars; `...` is appended only when cut.
pub fn clean_summary(html: &str, budget: usize) -> String {
    let text = strip_html(html);
    if text.chars().count() <= budget {
        return text;
    }
    let mut cut: String = text.chars().take(budget).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut
}

/// Newest first. Stable, so equal timestamps keep provider order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Fetch every provider in turn. A failing provider is logged and skipped.
pub async fn run_once(providers: &[Box<dyn SourceProvider>]) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                tracing::debug!(provider = %p.name(), items = v.len(), "provider ok");
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = %p.name(), "provider error");
                counter!("digest_provider_errors_total").increment(1);
            }
        }
    }

    sort_newest_first(&mut raw);
    counter!("digest_items_fetched_total").increment(raw.len() as u64);
    raw
}
