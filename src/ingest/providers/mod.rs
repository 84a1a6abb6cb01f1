// src/ingest/providers/mod.rs
pub mod feed;
pub mod reddit;
pub mod rss;

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::ingest::types::SourceProvider;
use reddit::RedditProvider;
use rss::RssFeedProvider;

/// One client for all source fetches: shared timeout and User-Agent.
pub fn http_client(cfg: &SourcesConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.clone())
        .build()
        .context("building source http client")
}

/// Feeds first, then subreddits, in configuration order.
pub fn build_providers(cfg: &SourcesConfig) -> Result<Vec<Box<dyn SourceProvider>>> {
    let client = http_client(cfg)?;
    let mut out: Vec<Box<dyn SourceProvider>> =
        Vec::with_capacity(cfg.feeds.len() + cfg.subreddits.len());
    for url in &cfg.feeds {
        out.push(Box::new(RssFeedProvider::from_url(url, cfg, client.clone())));
    }
    for sub in &cfg.subreddits {
        out.push(Box::new(RedditProvider::new(sub, cfg, client.clone())));
    }
    Ok(out)
}
