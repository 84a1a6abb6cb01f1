// src/select/prompt.rs
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::config::SelectionConfig;
use crate::history::SeenUrlSet;
use crate::ingest::types::{Mode, NewsItem};

#[derive(Serialize)]
struct PromptInput<'a> {
    items: &'a [NewsItem],
    seen_urls: &'a [String],
}

/// "September 06, 2025" in the target timezone.
pub fn digest_date(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format("%B %d, %Y").to_string()
}

pub fn build_prompt(
    items: &[NewsItem],
    seen: &SeenUrlSet,
    mode: Mode,
    now: DateTime<Utc>,
    cfg: &SelectionConfig,
    offset: FixedOffset,
) -> serde_json::Result<String> {
    let input = serde_json::to_string_pretty(&PromptInput {
        items,
        seen_urls: seen.as_slice(),
    })?;

    let mut p = String::with_capacity(input.len() + 2048);
    p.push_str(&format!("You are {}.\n", cfg.curator));
    p.push_str(&format!("Today is {}.\n", digest_date(now, offset)));
    p.push_str(&format!("Current Mode: {}\n\n", mode.as_str().to_uppercase()));

    p.push_str("INPUT DATA:\n");
    p.push_str(&input);
    p.push_str("\n\nTASK:\n");
    p.push_str(&format!(
        "Select the best items to create a curated tech digest in JSON format for the '{}' category.\n\n",
        mode.as_str()
    ));

    p.push_str("CRITICAL RULES:\n");
    p.push_str("1. DUPLICATE PREVENTION:\n");
    p.push_str("   - 'seen_urls' contains previously posted URLs. NEVER select any item found in this list.\n");
    p.push_str("   - Check closely for duplicate topics/stories even if URLs differ; keep only the best source.\n");

    p.push_str("2. SELECTION:\n");
    match mode {
        Mode::Research => {
            push_research_rules(&mut p, cfg);
            p.push_str("   - ONLY return items with type=\"research\" or relevant to research.\n");
        }
        Mode::News => {
            push_news_rules(&mut p, cfg);
            p.push_str("   - ONLY return items with type=\"news\" or relevant to tech news.\n");
        }
        Mode::All => {
            push_research_rules(&mut p, cfg);
            push_news_rules(&mut p, cfg);
        }
    }

    p.push_str("3. CONTENT STYLE:\n");
    p.push_str("   - Titles: clean, unformatted text. No markdown.\n");
    p.push_str(&format!(
        "   - Summaries: plain text, factual, neutral tone, under {} words.\n",
        cfg.summary_words
    ));
    p.push_str("   - Sources: clean name (e.g. \"TechCrunch\", \"Arxiv\").\n");
    p.push_str(&format!(
        "   - Diversity: max {} items from the same source.\n\n",
        cfg.max_per_source
    ));

    if mode != Mode::News && !cfg.focus_topics.is_empty() {
        p.push_str("4. AI CONCEPTS TO COVER (if applicable):\n");
        for topic in &cfg.focus_topics {
            p.push_str(&format!("   - {topic}\n"));
        }
        p.push('\n');
    }

    p.push_str("OUTPUT FORMAT:\n");
    p.push_str("Return valid JSON only. Do NOT output Markdown.\n\n");
    p.push_str("JSON SCHEMA:\n");
    p.push_str(
        r#"{
  "items": [
    {
      "type": "📄" or "🧠" (for research) / "🔹" (for news),
      "title": "Title String",
      "summary": "Summary String",
      "source": "Source Name",
      "url": "URL"
    }
  ]
}
"#,
    );
    Ok(p)
}

fn priority(sources: &[String]) -> String {
    if sources.is_empty() {
        String::new()
    } else {
        format!(" (Priority: {})", sources.join(", "))
    }
}

fn push_research_rules(p: &mut String, cfg: &SelectionConfig) {
    p.push_str(&format!(
        "   - RESEARCH{}: select {} items.\n",
        priority(&cfg.research_priority_sources),
        cfg.research.describe()
    ));
    p.push_str(&format!(
        "     Include recent papers (~{} days), AI concepts, strong engineering blogs.\n",
        cfg.research_window_days
    ));
    p.push_str("     Exclude GitHub PRs, commits, issues, changelogs and minor code releases.\n");
}

fn push_news_rules(p: &mut String, cfg: &SelectionConfig) {
    p.push_str(&format!(
        "   - NEWS{}: select {} items (product launches, funding, policy, major moves).\n",
        priority(&cfg.news_priority_sources),
        cfg.news.describe()
    ));
    p.push_str("     Avoid clickbait.\n");
}
