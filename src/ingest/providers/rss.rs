// src/ingest/providers/rss.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::feed::{parse_feed, to_news_items, EntryMapping, UNKNOWN_SOURCE};
use crate::config::SourcesConfig;
use crate::ingest::types::{Category, NewsItem, SourceProvider};

/// Generic syndication feed (RSS 2.0 or Atom).
pub struct RssFeedProvider {
    feed_url: String,
    category: Category,
    limit: usize,
    summary_chars: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RssFeedProvider {
    pub fn from_url(feed_url: &str, cfg: &SourcesConfig, client: reqwest::Client) -> Self {
        Self::with_mode(feed_url, cfg, Mode::Http { client })
    }

    /// `feed_url` is still used for research classification.
    pub fn from_fixture(feed_url: &str, xml: &str, cfg: &SourcesConfig) -> Self {
        Self::with_mode(feed_url, cfg, Mode::Fixture(xml.to_string()))
    }

    fn with_mode(feed_url: &str, cfg: &SourcesConfig, mode: Mode) -> Self {
        let category = if cfg.is_research_feed(feed_url) {
            Category::Research
        } else {
            Category::News
        };
        Self {
            feed_url: feed_url.to_string(),
            category,
            limit: cfg.per_feed_limit,
            summary_chars: cfg.summary_chars,
            mode,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    fn parse_items_from_str(&self, xml: &str) -> Result<Vec<NewsItem>> {
        let feed = parse_feed(xml).with_context(|| format!("feed {}", self.feed_url))?;
        let map = EntryMapping {
            source: feed.title.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            category: self.category,
            limit: self.limit,
            summary_chars: self.summary_chars,
            summary_override: None,
            fetched_at: Utc::now(),
        };
        Ok(to_news_items(feed.entries, &map))
    }
}

#[async_trait]
impl SourceProvider for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { client } => {
                let resp = client
                    .get(&self.feed_url)
                    .send()
                    .await
                    .with_context(|| format!("GET {}", self.feed_url))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("feed HTTP {status} for {}", self.feed_url);
                }
                let body = resp.text().await.context("feed http .text()")?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> String {
        self.feed_url.clone()
    }
}
