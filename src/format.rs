//! Telegram MarkdownV2 rendering of a curated digest.

use chrono::{DateTime, Timelike, Utc};

use crate::config::FormatConfig;
use crate::ingest::types::{Category, Mode};
use crate::select::prompt::digest_date;
use crate::select::schema::{Digest, DigestItem};

/// Characters MarkdownV2 reserves outside of entities.
pub const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub const RESEARCH_HEADING: &str = "🔬 *RESEARCH & AI CONCEPTS*";
pub const NEWS_HEADING: &str = "📰 *TOP STORIES*";
pub const NO_RESEARCH: &str = "_\\(No research items today\\)_";
pub const NO_NEWS: &str = "_\\(No top stories today\\)_";
pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

fn needs_escape(c: char) -> bool {
    c == '\\' || MARKDOWN_V2_SPECIAL.contains(&c)
}

pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if needs_escape(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inverse of [`escape_markdown_v2`]; used for the plain-text resend.
pub fn unescape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if needs_escape(next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Link target for an item: http(s) URLs pass through, anything else becomes `fallback`.
/// `)` would end the link early, so it is percent-encoded.
pub fn link_target(url: &str, fallback: &str) -> String {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        url.replace(')', "%29")
    } else {
        fallback.to_string()
    }
}

fn greeting(now: DateTime<Utc>, cfg: &FormatConfig) -> &'static str {
    if now.with_timezone(&cfg.offset()).hour() < 12 {
        "🌅 *GM*"
    } else {
        "☕ *Good Afternoon*"
    }
}

fn topic_header(mode: Mode) -> &'static str {
    match mode {
        Mode::All => "🗞️ *TECH DIGEST*",
        Mode::Research => "🔬 *RESEARCH & AI PAPERS*",
        Mode::News => "📰 *TECH NEWS & UPDATES*",
    }
}

fn render_entry(index: usize, item: &DigestItem, section: Category, cfg: &FormatConfig) -> String {
    let title = if item.title.trim().is_empty() {
        "Untitled"
    } else {
        item.title.trim()
    };
    let source = if item.source.trim().is_empty() {
        "Source"
    } else {
        item.source.trim()
    };

    let mut entry = format!(
        "{index}\\. {} *{}*\n",
        escape_markdown_v2(item.icon(section)),
        escape_markdown_v2(title)
    );
    let summary = item.summary.trim();
    if !summary.is_empty() {
        entry.push_str(&escape_markdown_v2(summary));
        entry.push('\n');
    }
    entry.push_str(&format!(
        "📎 [{}]({})",
        escape_markdown_v2(source),
        link_target(&item.url, &cfg.fallback_url)
    ));
    entry
}

fn render_section(
    out: &mut String,
    heading: &str,
    items: &[DigestItem],
    section: Category,
    placeholder: &str,
    cfg: &FormatConfig,
) {
    out.push_str(heading);
    out.push_str("\n\n");
    if items.is_empty() {
        out.push_str(placeholder);
        out.push_str("\n\n");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        out.push_str(&render_entry(i + 1, item, section, cfg));
        out.push_str("\n\n");
    }
}

/// Full message: header, research section, news section, footer. Blocks are
/// separated by blank lines so the sender can split between them.
pub fn render_digest(digest: &Digest, mode: Mode, now: DateTime<Utc>, cfg: &FormatConfig) -> String {
    let mut out = String::with_capacity(512 + digest.len() * 256);
    out.push_str(&format!(
        "{} — {}\n{}\n\n",
        greeting(now, cfg),
        topic_header(mode),
        escape_markdown_v2(&digest_date(now, cfg.offset()))
    ));

    render_section(
        &mut out,
        RESEARCH_HEADING,
        &digest.research,
        Category::Research,
        NO_RESEARCH,
        cfg,
    );
    render_section(
        &mut out,
        NEWS_HEADING,
        &digest.news,
        Category::News,
        NO_NEWS,
        cfg,
    );

    out.push_str(RULE);
    out.push_str("\n🤖 _");
    out.push_str(&escape_markdown_v2(&cfg.brand));
    out.push('_');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn morning() -> DateTime<Utc> {
        // 09:30 IST
        Utc.with_ymd_and_hms(2025, 9, 6, 4, 0, 0).unwrap()
    }

    fn news(title: &str, url: &str) -> DigestItem {
        DigestItem {
            kind: "🔹".into(),
            title: title.into(),
            summary: "Short summary.".into(),
            source: "TechCrunch".into(),
            url: url.into(),
        }
    }

    #[test]
    fn escape_covers_every_special_char() {
        let all: String = MARKDOWN_V2_SPECIAL.iter().collect();
        let escaped = escape_markdown_v2(&all);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            assert_eq!(c, '\\');
            let next = chars.next().unwrap();
            assert!(MARKDOWN_V2_SPECIAL.contains(&next));
        }
        assert_eq!(escape_markdown_v2("a\\b"), "a\\\\b");
    }

    #[test]
    fn unescape_reverses_escape() {
        let s = "v1.2 (beta) - 50% off! a_b\\c";
        assert_eq!(unescape_markdown_v2(&escape_markdown_v2(s)), s);
    }

    #[test]
    fn empty_digest_renders_both_placeholders() {
        let msg = render_digest(&Digest::default(), Mode::All, morning(), &FormatConfig::default());
        assert!(msg.starts_with("🌅 *GM* — 🗞️ *TECH DIGEST*\nSeptember 06, 2025\n\n"));
        assert!(msg.contains(RESEARCH_HEADING));
        assert!(msg.contains(NO_RESEARCH));
        assert!(msg.contains(NEWS_HEADING));
        assert!(msg.contains(NO_NEWS));
        assert!(msg.ends_with("━━━━━━━━━━━━━━━━━━━━\n🤖 _Tech Digest_"));
    }

    #[test]
    fn afternoon_greeting_uses_target_timezone() {
        // 07:00 UTC is 12:30 IST
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 7, 0, 0).unwrap();
        let msg = render_digest(&Digest::default(), Mode::News, now, &FormatConfig::default());
        assert!(msg.starts_with("☕ *Good Afternoon* — 📰 *TECH NEWS & UPDATES*"));
    }

    #[test]
    fn entry_shape_and_escaping() {
        let digest = Digest {
            research: vec![],
            news: vec![news("GPT-5 is out!", "https://tc.test/gpt-5")],
        };
        let msg = render_digest(&digest, Mode::All, morning(), &FormatConfig::default());
        assert!(msg.contains(
            "1\\. 🔹 *GPT\\-5 is out\\!*\nShort summary\\.\n📎 [TechCrunch](https://tc.test/gpt-5)"
        ));
    }

    #[test]
    fn free_form_type_tag_is_escaped() {
        let item = DigestItem {
            kind: "🧠 (paper)".into(),
            ..news("Sparse MoE", "https://r.test/moe")
        };
        let digest = Digest {
            research: vec![item],
            news: vec![],
        };
        let msg = render_digest(&digest, Mode::Research, morning(), &FormatConfig::default());
        let line = msg.lines().find(|l| l.starts_with("1\\.")).unwrap();
        assert_eq!(line, "1\\. 🧠 \\(paper\\) *Sparse MoE*");
    }

    #[test]
    fn duplicate_titles_are_both_rendered() {
        let digest = Digest {
            research: vec![],
            news: vec![news("Same", "https://a.test"), news("Same", "https://b.test")],
        };
        let msg = render_digest(&digest, Mode::All, morning(), &FormatConfig::default());
        assert!(msg.contains("1\\. 🔹 *Same*"));
        assert!(msg.contains("2\\. 🔹 *Same*"));
    }

    #[test]
    fn non_http_url_uses_fallback_and_defaults_apply() {
        let item = DigestItem {
            url: "ftp://x".into(),
            ..DigestItem::default()
        };
        let digest = Digest {
            research: vec![item],
            news: vec![],
        };
        let msg = render_digest(&digest, Mode::Research, morning(), &FormatConfig::default());
        assert!(msg.contains("1\\. 📄 *Untitled*\n📎 [Source](https://google.com)"));
    }

    #[test]
    fn closing_paren_in_url_is_encoded() {
        assert_eq!(
            link_target("https://en.wikipedia.org/wiki/Rust_(language)", "https://google.com"),
            "https://en.wikipedia.org/wiki/Rust_(language%29"
        );
    }
}
