// src/select/schema.rs
//! Response decoding. The service answers either with a flat `items` list or with
//! separate `research` / `news` lists; both normalize into [`Digest`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::SelectError;
use crate::ingest::types::Category;

pub const RESEARCH_ICON: &str = "📄";
pub const NEWS_ICON: &str = "🔹";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestItem {
    /// Icon or category word, whatever the service put in `type`.
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, alias = "headline", deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl DigestItem {
    /// Section a flat-schema item belongs to.
    pub fn section(&self) -> Category {
        let k = self.kind.trim();
        if k == NEWS_ICON || k.eq_ignore_ascii_case("news") {
            Category::News
        } else {
            Category::Research
        }
    }

    /// The item's own icon, or the section default when `type` is empty or a plain word.
    pub fn icon(&self, section: Category) -> &str {
        let k = self.kind.trim();
        let is_word = k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if k.is_empty() || is_word {
            match section {
                Category::Research => RESEARCH_ICON,
                Category::News => NEWS_ICON,
            }
        } else {
            k
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub research: Vec<DigestItem>,
    pub news: Vec<DigestItem>,
}

impl Digest {
    pub fn len(&self) -> usize {
        self.research.len() + self.news.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_flat(items: Vec<DigestItem>) -> Self {
        let (news, research): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|it| it.section() == Category::News);
        Self { research, news }
    }
}

#[derive(Deserialize)]
struct FlatSchema {
    #[serde(default)]
    items: Vec<DigestItem>,
}

#[derive(Deserialize)]
struct SectionedSchema {
    #[serde(default)]
    research: Vec<DigestItem>,
    #[serde(default)]
    news: Vec<DigestItem>,
}

/// Which response shape a parsed body turned out to be.
#[derive(Debug, PartialEq, Eq)]
enum ResponseSchema {
    Flat(Vec<DigestItem>),
    Sectioned {
        research: Vec<DigestItem>,
        news: Vec<DigestItem>,
    },
    Empty,
}

impl ResponseSchema {
    fn classify(value: Value) -> Self {
        if !value.is_object() {
            return ResponseSchema::Empty;
        }
        if let Ok(FlatSchema { items }) = serde_json::from_value(value.clone()) {
            if !items.is_empty() {
                return ResponseSchema::Flat(items);
            }
        }
        match serde_json::from_value::<SectionedSchema>(value) {
            Ok(s) if !(s.research.is_empty() && s.news.is_empty()) => ResponseSchema::Sectioned {
                research: s.research,
                news: s.news,
            },
            _ => ResponseSchema::Empty,
        }
    }

    fn into_digest(self) -> Digest {
        match self {
            ResponseSchema::Flat(items) => Digest::from_flat(items),
            ResponseSchema::Sectioned { research, news } => Digest { research, news },
            ResponseSchema::Empty => Digest::default(),
        }
    }
}

/// Remove markdown code fences the service sometimes wraps JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn decode_digest(raw: &str) -> Result<Digest, SelectError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(SelectError::Parse)?;
    Ok(ResponseSchema::classify(value).into_digest())
}

// null, numbers and missing values all become text rather than failing the whole item
fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let raw = "```json\n{\"items\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"items\": []}");
    }

    #[test]
    fn flat_items_are_sectioned_by_type() {
        let raw = r#"{"items":[
            {"type":"📄","title":"Paper","summary":"s","source":"Arxiv","url":"https://arxiv.org/1"},
            {"type":"🔹","title":"Launch","summary":"s","source":"Verge","url":"https://verge.test/1"},
            {"type":"news","headline":"Funding","source":"TC","url":"https://tc.test/1"}
        ]}"#;
        let d = decode_digest(raw).unwrap();
        assert_eq!(d.research.len(), 1);
        assert_eq!(d.news.len(), 2);
        assert_eq!(d.news[1].title, "Funding");
        assert_eq!(d.news[1].summary, "");
    }

    #[test]
    fn two_list_schema_is_accepted() {
        let raw = r#"{"research":[{"title":"R","url":"https://r.test"}],"news":[]}"#;
        let d = decode_digest(raw).unwrap();
        assert_eq!(d.research.len(), 1);
        assert!(d.news.is_empty());
    }

    #[test]
    fn empty_items_falls_back_to_two_lists() {
        let raw = r#"{"items":[],"news":[{"title":"N","url":"https://n.test"}]}"#;
        let d = decode_digest(raw).unwrap();
        assert_eq!(d.news.len(), 1);
    }

    #[test]
    fn unknown_shape_is_empty_digest() {
        assert!(decode_digest(r#"{"stories":[1,2]}"#).unwrap().is_empty());
        assert!(decode_digest("[]").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            decode_digest("Sure! Here is your digest"),
            Err(SelectError::Parse(_))
        ));
    }

    #[test]
    fn null_fields_do_not_fail_the_item() {
        let raw = r#"{"items":[{"type":null,"title":"T","summary":null,"source":7,"url":"https://x.test"}]}"#;
        let d = decode_digest(raw).unwrap();
        assert_eq!(d.research[0].source, "7");
    }

    #[test]
    fn icon_defaults_by_section() {
        let word = DigestItem {
            kind: "research".into(),
            ..DigestItem::default()
        };
        assert_eq!(word.icon(Category::Research), RESEARCH_ICON);
        let brain = DigestItem {
            kind: "🧠".into(),
            ..DigestItem::default()
        };
        assert_eq!(brain.icon(Category::Research), "🧠");
        assert_eq!(DigestItem::default().icon(Category::News), NEWS_ICON);
    }
}
