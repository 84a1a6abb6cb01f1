// src/config/digest.rs
use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::ingest::recency::MAX_WINDOW_HOURS;

/// Offsets must stay strictly inside one day.
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

/// Whole-run configuration. Every field has a default so a partial TOML file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub sources: SourcesConfig,
    pub filter: FilterConfig,
    pub selection: SelectionConfig,
    pub retry: RetryConfig,
    pub format: FormatConfig,
    pub delivery: DeliveryConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub feeds: Vec<String>,
    pub subreddits: Vec<String>,
    /// A feed whose URL contains one of these (case-insensitive) is research.
    pub research_markers: Vec<String>,
    pub research_subreddits: Vec<String>,
    pub per_feed_limit: usize,
    pub per_subreddit_limit: usize,
    pub reddit_listing_limit: usize,
    pub reddit_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub summary_chars: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            feeds: [
                "https://techcrunch.com/feed/",
                "http://feeds.arstechnica.com/arstechnica/index",
                "https://www.theverge.com/rss/index.xml",
                "https://www.wired.com/feed/rss",
                "https://venturebeat.com/category/ai/feed/",
                "https://openai.com/blog/rss/",
                "https://research.google/blog/rss/",
                "https://www.anthropic.com/rss",
                "https://huggingface.co/blog/feed.xml",
                "https://aws.amazon.com/blogs/machine-learning/feed/",
                "https://news.ycombinator.com/rss",
            ]
            .map(String::from)
            .to_vec(),
            subreddits: ["MachineLearning", "artificial", "LocalLLaMA", "technology", "singularity"]
                .map(String::from)
                .to_vec(),
            research_markers: vec!["research".into(), "blog".into()],
            research_subreddits: ["MachineLearning", "LocalLLaMA", "singularity"]
                .map(String::from)
                .to_vec(),
            per_feed_limit: 30,
            per_subreddit_limit: 20,
            reddit_listing_limit: 10,
            reddit_base: "https://www.reddit.com".into(),
            user_agent: "Mozilla/5.0 (compatible; digest-bot/0.1)".into(),
            timeout_secs: 10,
            summary_chars: 300,
        }
    }
}

impl SourcesConfig {
    pub fn is_research_feed(&self, feed_url: &str) -> bool {
        let url = feed_url.to_ascii_lowercase();
        self.research_markers
            .iter()
            .any(|m| !m.is_empty() && url.contains(&m.to_ascii_lowercase()))
    }

    pub fn is_research_subreddit(&self, sub: &str) -> bool {
        self.research_subreddits
            .iter()
            .any(|s| s.eq_ignore_ascii_case(sub))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub recency_enabled: bool,
    pub recency_hours: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            recency_enabled: true,
            recency_hours: 24,
        }
    }
}

/// How many items the generation service should pick for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCount {
    AtMost(usize),
    Exactly(usize),
    AllRelevant,
}

impl ItemCount {
    pub fn describe(self) -> String {
        match self {
            ItemCount::AtMost(n) => format!("at most {n}"),
            ItemCount::Exactly(n) => format!("exactly {n}"),
            ItemCount::AllRelevant => "all relevant, high-quality".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_input_items: usize,
    pub max_per_source: usize,
    pub summary_words: usize,
    pub research: ItemCount,
    pub news: ItemCount,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
    /// Persona line at the top of the prompt.
    pub curator: String,
    pub research_priority_sources: Vec<String>,
    pub news_priority_sources: Vec<String>,
    /// How far back a paper may be and still count as recent.
    pub research_window_days: u32,
    /// Concepts the research section should favor, one prompt line each.
    pub focus_topics: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_input_items: 60,
            max_per_source: 2,
            summary_words: 25,
            research: ItemCount::AtMost(5),
            news: ItemCount::Exactly(3),
            model: "gemini-2.0-flash".into(),
            api_base: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 60,
            curator: "an AI-powered daily tech news curator".into(),
            research_priority_sources: ["Arxiv", "HuggingFace", "DeepMind", "OpenAI"]
                .map(String::from)
                .to_vec(),
            news_priority_sources: ["TechCrunch", "Verge", "Wired", "VentureBeat"]
                .map(String::from)
                .to_vec(),
            research_window_days: 7,
            focus_topics: [
                "MoE, SSM, Mamba, Transformers++",
                "RLHF, DPO, LoRA, RAG",
                "Agents (CoT, ToT), Multimodal",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub brand: String,
    /// Target timezone as a fixed UTC offset (IST = +330).
    pub utc_offset_minutes: i32,
    pub fallback_url: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            brand: "Tech Digest".into(),
            utc_offset_minutes: 330,
            fallback_url: "https://google.com".into(),
        }
    }
}

impl FormatConfig {
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub api_base: String,
    pub max_message_chars: usize,
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            max_message_chars: 4000,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("seen_urls.json"),
            capacity: 300,
        }
    }
}

impl DigestConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        let mut cfg: DigestConfig = toml::from_str(&data)
            .with_context(|| format!("parsing digest config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// 1) $DIGEST_CONFIG_PATH  2) config/digest.toml  3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        Ok(Self::default())
    }

    fn sanitize(&mut self) {
        self.sources.feeds = clean_list(std::mem::take(&mut self.sources.feeds));
        self.sources.subreddits = clean_list(std::mem::take(&mut self.sources.subreddits));
        if self.sources.summary_chars == 0 {
            self.sources.summary_chars = SourcesConfig::default().summary_chars;
        }
        if self.filter.recency_hours <= 0 {
            self.filter.recency_hours = FilterConfig::default().recency_hours;
        }
        self.filter.recency_hours = self.filter.recency_hours.min(MAX_WINDOW_HOURS);
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.format.utc_offset_minutes) {
            tracing::warn!(
                minutes = self.format.utc_offset_minutes,
                "utc_offset_minutes out of range, using UTC"
            );
            self.format.utc_offset_minutes = 0;
        }
        if self.selection.max_input_items == 0 {
            self.selection.max_input_items = SelectionConfig::default().max_input_items;
        }
        // at least one attempt, otherwise the generation service is never called
        self.retry.max_attempts = self.retry.max_attempts.max(1);
        if self.delivery.max_message_chars == 0 {
            self.delivery.max_message_chars = DeliveryConfig::default().max_message_chars;
        }
        if self.store.capacity == 0 {
            self.store.capacity = StoreConfig::default().capacity;
        }
    }
}

/// Credentials, always taken from the environment (never from the TOML file).
#[derive(Clone)]
pub struct Secrets {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub gemini_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telegram_token: require_env("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: require_env("TELEGRAM_CHAT_ID")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
        })
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_token_len", &self.telegram_token.len())
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("gemini_api_key_len", &self.gemini_api_key.len())
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(anyhow!("Missing {key} env var")),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
