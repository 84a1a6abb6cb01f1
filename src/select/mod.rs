// src/select/mod.rs
//! Digest selection: narrow the fetched items, ask the generation service to curate
//! them, decode the answer.

pub mod ai_adapter;
pub mod prompt;
pub mod retry;
pub mod schema;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use thiserror::Error;

use crate::config::{DigestConfig, SelectionConfig};
use crate::history::SeenUrlSet;
use crate::ingest::sort_newest_first;
use crate::ingest::types::{Mode, NewsItem};
use ai_adapter::{GenerationError, GenerationService};
use retry::{RetryPolicy, Sleeper, TokioSleeper};
use schema::{decode_digest, Digest};

#[derive(Debug, Error)]
pub enum SelectError {
    #[error(transparent)]
    Generation(GenerationError),
    #[error("generation still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("building prompt: {0}")]
    Prompt(#[source] serde_json::Error),
}

/// The curated subset for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub digest: Digest,
    pub mode: Mode,
}

// Traced at debug level, one line per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptState {
    Idle,
    RequestSent { attempt: u32 },
    RateLimited { attempt: u32 },
    Parsed,
    Failed,
}

fn trace_state(state: AttemptState) {
    tracing::debug!(state = ?state, "selector attempt");
}

pub struct Selector {
    generator: Arc<dyn GenerationService>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    cfg: SelectionConfig,
    offset: FixedOffset,
}

impl Selector {
    pub fn new(generator: Arc<dyn GenerationService>, cfg: &DigestConfig) -> Self {
        Self {
            generator,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::from_config(&cfg.retry),
            cfg: cfg.selection.clone(),
            offset: cfg.format.offset(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Keep the mode's category, newest first, capped at `max_input_items`.
    pub fn prepare(&self, items: Vec<NewsItem>, mode: Mode) -> Vec<NewsItem> {
        let mut kept: Vec<NewsItem> = match mode.category() {
            Some(cat) => items.into_iter().filter(|it| it.category == cat).collect(),
            None => items,
        };
        sort_newest_first(&mut kept);
        if kept.len() > self.cfg.max_input_items {
            tracing::info!(
                from = kept.len(),
                to = self.cfg.max_input_items,
                "truncating selector input"
            );
            kept.truncate(self.cfg.max_input_items);
        }
        kept
    }

    pub async fn select(
        &self,
        items: &[NewsItem],
        seen: &SeenUrlSet,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> Result<Selection, SelectError> {
        let prompt = prompt::build_prompt(items, seen, mode, now, &self.cfg, self.offset)
            .map_err(SelectError::Prompt)?;

        tracing::info!(
            items = items.len(),
            mode = %mode,
            provider = self.generator.provider_name(),
            "generating digest"
        );

        let raw = self.generate_with_retry(&prompt).await?;
        match decode_digest(&raw) {
            Ok(digest) => {
                trace_state(AttemptState::Parsed);
                tracing::info!(
                    research = digest.research.len(),
                    news = digest.news.len(),
                    "digest decoded"
                );
                Ok(Selection { digest, mode })
            }
            Err(e) => {
                trace_state(AttemptState::Failed);
                Err(e)
            }
        }
    }

    async fn generate_with_retry(&self, prompt: &str) -> Result<String, SelectError> {
        trace_state(AttemptState::Idle);
        let mut attempt: u32 = 0;
        loop {
            trace_state(AttemptState::RequestSent { attempt });
            match self.generator.generate(prompt).await {
                Ok(raw) => return Ok(raw),
                Err(GenerationError::RateLimited) => {
                    trace_state(AttemptState::RateLimited { attempt });
                    if !self.policy.can_retry(attempt) {
                        trace_state(AttemptState::Failed);
                        return Err(SelectError::RetriesExhausted {
                            attempts: attempt + 1,
                        });
                    }
                    let wait = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "generation rate limited, retrying"
                    );
                    counter!("digest_generation_retries_total").increment(1);
                    self.sleeper.sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    trace_state(AttemptState::Failed);
                    return Err(SelectError::Generation(e));
                }
            }
        }
    }
}
