// src/ingest/providers/feed.rs
//! RSS 2.0 / Atom document model shared by the feed and Reddit providers.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::{Category, NewsItem};
use crate::ingest::{clean_summary, strip_html};

pub const UNKNOWN_SOURCE: &str = "Unknown Source";

// Root element name is not checked, so `<rss>` and `<feed>` both land here.
#[derive(Debug, Deserialize)]
struct Document {
    channel: Option<Channel>,
    title: Option<Text>,
    #[serde(default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<Text>,
    #[serde(default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<Text>,
    description: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    #[serde(default)]
    link: Vec<AtomLink>,
    summary: Option<Text>,
    content: Option<Text>,
    published: Option<Text>,
    updated: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element text, ignoring any attributes (`<title type="html">`).
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

fn text(t: Option<Text>) -> Option<String> {
    t.map(|t| t.value.trim().to_string()).filter(|s| !s.is_empty())
}

/// One entry, format-independent, before it becomes a `NewsItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    pub summary_html: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let doc: Document = from_str(&xml_clean).context("parsing feed xml")?;

    if let Some(channel) = doc.channel {
        let entries = channel
            .item
            .into_iter()
            .filter_map(|it| {
                let link = text(it.link)?;
                Some(ParsedEntry {
                    title: text(it.title).unwrap_or_default(),
                    link,
                    summary_html: text(it.description).unwrap_or_default(),
                    published: text(it.pub_date).as_deref().and_then(parse_published),
                })
            })
            .collect();
        return Ok(ParsedFeed {
            title: text(channel.title),
            entries,
        });
    }

    let entries = doc
        .entry
        .into_iter()
        .filter_map(|e| {
            let link = pick_atom_link(&e.link)?;
            let published = text(e.published)
                .or_else(|| text(e.updated))
                .as_deref()
                .and_then(parse_published);
            Some(ParsedEntry {
                title: text(e.title).unwrap_or_default(),
                link,
                summary_html: text(e.summary).or_else(|| text(e.content)).unwrap_or_default(),
                published,
            })
        })
        .collect();
    Ok(ParsedFeed {
        title: text(doc.title),
        entries,
    })
}

fn pick_atom_link(links: &[AtomLink]) -> Option<String> {
    let alternate = links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")));
    alternate
        .or_else(|| links.first())
        .and_then(|l| l.href.as_deref())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// RFC 2822 (RSS) or RFC 3339 (Atom). `None` when neither parses.
pub fn parse_published(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let unix = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .map(|dt| dt.unix_timestamp());
    if let Some(secs) = unix {
        return DateTime::from_timestamp(secs, 0);
    }
    // chrono accepts obsolete zone names ("GMT", "EST") that `time` rejects
    DateTime::parse_from_rfc2822(ts)
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// How a provider turns parsed entries into items.
#[derive(Debug, Clone)]
pub struct EntryMapping {
    pub source: String,
    pub category: Category,
    pub limit: usize,
    pub summary_chars: usize,
    /// Fixed summary instead of the entry's own text.
    pub summary_override: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

pub fn to_news_items(entries: Vec<ParsedEntry>, map: &EntryMapping) -> Vec<NewsItem> {
    entries
        .into_iter()
        .take(map.limit)
        .map(|e| NewsItem {
            title: strip_html(&e.title),
            summary: match &map.summary_override {
                Some(s) => s.clone(),
                None => clean_summary(&e.summary_html, map.summary_chars),
            },
            source: map.source.clone(),
            url: e.link,
            published_at: e.published.unwrap_or(map.fetched_at),
            category: map.category,
        })
        .collect()
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
