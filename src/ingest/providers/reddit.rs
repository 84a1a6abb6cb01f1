// src/ingest/providers/reddit.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::feed::{parse_feed, to_news_items, EntryMapping};
use crate::config::SourcesConfig;
use crate::ingest::types::{Category, NewsItem, SourceProvider};

/// Discussion threads are not fetched, so every item gets this summary.
pub const REDDIT_SUMMARY: &str = "Reddit Discussion";

/// "Top of the day" listing of one subreddit, read through its public Atom feed.
pub struct RedditProvider {
    subreddit: String,
    category: Category,
    limit: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        listing_limit: usize,
        client: reqwest::Client,
    },
}

impl RedditProvider {
    /// `client` should carry a descriptive User-Agent; reddit rejects anonymous defaults.
    pub fn new(subreddit: &str, cfg: &SourcesConfig, client: reqwest::Client) -> Self {
        let url = format!(
            "{}/r/{}/top/.rss",
            cfg.reddit_base.trim_end_matches('/'),
            subreddit
        );
        Self::with_mode(
            subreddit,
            cfg,
            Mode::Http {
                url,
                listing_limit: cfg.reddit_listing_limit,
                client,
            },
        )
    }

    pub fn from_fixture(subreddit: &str, xml: &str, cfg: &SourcesConfig) -> Self {
        Self::with_mode(subreddit, cfg, Mode::Fixture(xml.to_string()))
    }

    fn with_mode(subreddit: &str, cfg: &SourcesConfig, mode: Mode) -> Self {
        let category = if cfg.is_research_subreddit(subreddit) {
            Category::Research
        } else {
            Category::News
        };
        Self {
            subreddit: subreddit.to_string(),
            category,
            limit: cfg.per_subreddit_limit,
            mode,
        }
    }

    fn parse_items_from_str(&self, xml: &str) -> Result<Vec<NewsItem>> {
        let feed = parse_feed(xml).with_context(|| format!("listing r/{}", self.subreddit))?;
        let map = EntryMapping {
            source: format!("r/{}", self.subreddit),
            category: self.category,
            limit: self.limit,
            summary_chars: 0,
            summary_override: Some(REDDIT_SUMMARY.to_string()),
            fetched_at: Utc::now(),
        };
        Ok(to_news_items(feed.entries, &map))
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http {
                url,
                listing_limit,
                client,
            } => {
                let limit = listing_limit.to_string();
                let resp = client
                    .get(url)
                    .query(&[("t", "day"), ("limit", limit.as_str())])
                    .send()
                    .await
                    .with_context(|| format!("GET r/{}", self.subreddit))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("reddit HTTP {status} for r/{}", self.subreddit);
                }
                let body = resp.text().await.context("reddit http .text()")?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> String {
        format!("r/{}", self.subreddit)
    }
}
