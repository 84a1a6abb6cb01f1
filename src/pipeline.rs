//! One pass of the digest: fetch, filter, select, render, deliver, remember.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::{DigestConfig, Secrets};
use crate::format::render_digest;
use crate::history::{extract_link_targets, SeenUrlStore};
use crate::ingest::{self, providers::build_providers, recency::filter_recent};
use crate::ingest::types::{Mode, SourceProvider};
use crate::notify::telegram::TelegramSender;
use crate::notify::{deliver, ChatSender, DeliveryReport};
use crate::select::ai_adapter::GeminiClient;
use crate::select::Selector;

/// How a run ended. Only `Delivered` touches the seen-URL store.
#[derive(Debug)]
pub enum RunOutcome {
    NoItems,
    NoFreshItems,
    SelectionFailed(String),
    Delivered {
        report: DeliveryReport,
        /// Link targets recorded as posted by this run.
        saved_urls: Vec<String>,
    },
}

pub struct Pipeline {
    cfg: DigestConfig,
    providers: Vec<Box<dyn SourceProvider>>,
    selector: Selector,
    sender: Arc<dyn ChatSender>,
    store: SeenUrlStore,
}

impl Pipeline {
    pub fn new(
        cfg: DigestConfig,
        providers: Vec<Box<dyn SourceProvider>>,
        selector: Selector,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        let store = SeenUrlStore::new(cfg.store.path.clone(), cfg.store.capacity);
        Self {
            cfg,
            providers,
            selector,
            sender,
            store,
        }
    }

    /// Production wiring: configured feeds and subreddits, Gemini, Telegram.
    pub fn from_config(cfg: DigestConfig, secrets: &Secrets) -> Result<Self> {
        let providers = build_providers(&cfg.sources)?;
        let gemini = GeminiClient::new(&cfg.selection, &secrets.gemini_api_key)?;
        let selector = Selector::new(Arc::new(gemini), &cfg);
        let sender = TelegramSender::from_config(&cfg.delivery, secrets);
        Ok(Self::new(cfg, providers, selector, Arc::new(sender)))
    }

    pub fn store(&self) -> &SeenUrlStore {
        &self.store
    }

    pub async fn run_once(&self, mode: Mode, now: DateTime<Utc>) -> RunOutcome {
        tracing::info!(mode = %mode, providers = self.providers.len(), "digest run started");

        let items = ingest::run_once(&self.providers).await;
        if items.is_empty() {
            tracing::warn!("no items fetched from any source");
            return RunOutcome::NoItems;
        }
        tracing::info!(items = items.len(), "fetched");

        let items = if self.cfg.filter.recency_enabled {
            let (kept, dropped) = filter_recent(items, now, self.cfg.filter.recency_hours);
            tracing::info!(
                kept = kept.len(),
                dropped,
                window_hours = self.cfg.filter.recency_hours,
                "recency filter"
            );
            kept
        } else {
            items
        };
        if items.is_empty() {
            tracing::warn!("no items inside the recency window");
            return RunOutcome::NoFreshItems;
        }

        let items = self.selector.prepare(items, mode);
        if items.is_empty() {
            tracing::warn!(mode = %mode, "no items for this mode");
            return RunOutcome::NoFreshItems;
        }

        let seen = self.store.load();
        tracing::debug!(seen = seen.len(), "seen urls loaded");

        let selection = match self.selector.select(&items, &seen, mode, now).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "digest selection failed, skipping run");
                return RunOutcome::SelectionFailed(e.to_string());
            }
        };

        let message = render_digest(&selection.digest, selection.mode, now, &self.cfg.format);
        let report = deliver(
            self.sender.as_ref(),
            &message,
            self.cfg.delivery.max_message_chars,
        )
        .await;

        if !report.any_sent() {
            tracing::error!(chunks = report.chunks.len(), "nothing delivered, seen urls untouched");
            return RunOutcome::Delivered {
                report,
                saved_urls: Vec::new(),
            };
        }
        if !report.all_sent() {
            tracing::warn!(
                failed = report.failed_count(),
                total = report.chunks.len(),
                "partial delivery, saving urls of sent chunks only"
            );
        }

        let fallback = self.cfg.format.fallback_url.as_str();
        let mut saved_urls: Vec<String> = Vec::new();
        for url in report.sent_chunks().flat_map(extract_link_targets) {
            if url != fallback && !saved_urls.contains(&url) {
                saved_urls.push(url);
            }
        }
        let merged = self.store.merge_and_save(&seen, saved_urls.iter().cloned());
        tracing::info!(new = saved_urls.len(), total = merged.len(), "seen urls updated");

        RunOutcome::Delivered { report, saved_urls }
    }
}
