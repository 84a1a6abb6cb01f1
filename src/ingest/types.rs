// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section an item belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Research,
    News,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Research => "research",
            Category::News => "news",
        }
    }
}

/// One piece of fetched content. Serialized as-is into the generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub source: String, // display name, e.g. "TechCrunch", "r/LocalLLaMA"
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: Category,
}

/// Which categories a run targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    All,
    Research,
    News,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Research => "research",
            Mode::News => "news",
        }
    }

    /// `None` means every category passes.
    pub fn category(self) -> Option<Category> {
        match self {
            Mode::All => None,
            Mode::Research => Some(Category::Research),
            Mode::News => Some(Category::News),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Mode::All),
            "research" => Ok(Mode::Research),
            "news" => Ok(Mode::News),
            other => anyhow::bail!("unknown mode: {other} (expected all | research | news)"),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitive() {
        assert_eq!("Research".parse::<Mode>().unwrap(), Mode::Research);
        assert_eq!(" NEWS ".parse::<Mode>().unwrap(), Mode::News);
        assert_eq!("".parse::<Mode>().unwrap(), Mode::All);
        assert!("sports".parse::<Mode>().is_err());
    }

    #[test]
    fn category_serializes_under_type_key() {
        let item = NewsItem {
            title: "t".into(),
            summary: "s".into(),
            source: "src".into(),
            url: "https://example.test/a".into(),
            published_at: DateTime::from_timestamp(0, 0).unwrap(),
            category: Category::Research,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "research");
    }
}
