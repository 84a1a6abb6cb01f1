//! history.rs: persisted record of URLs already posted, bounded to the newest entries.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered, unique URLs; oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenUrlSet {
    urls: Vec<String>,
}

impl SeenUrlSet {
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.extend(urls);
        set
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }

    /// Append, keeping the first occurrence of each URL.
    fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for u in urls {
            let u = u.into();
            if !self.contains(&u) {
                self.urls.push(u);
            }
        }
    }

    /// Drop the oldest entries until at most `cap` remain.
    fn truncate_front(&mut self, cap: usize) {
        if self.urls.len() > cap {
            let excess = self.urls.len() - cap;
            self.urls.drain(0..excess);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeenUrlStore {
    path: PathBuf,
    cap: usize,
}

impl SeenUrlStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: anything but a readable JSON list of strings is an empty set.
    pub fn load(&self) -> SeenUrlSet {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, path = %self.path.display(), "seen urls unreadable");
                }
                return SeenUrlSet::default();
            }
        };
        match serde_json::from_str::<Vec<String>>(&data) {
            Ok(urls) => SeenUrlSet::from_urls(urls),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "seen urls corrupt, starting empty");
                SeenUrlSet::default()
            }
        }
    }

    /// Union (existing first), keep the newest `cap`, write. A failed write is logged
    /// and the merged set is returned anyway.
    pub fn merge_and_save<I, S>(&self, existing: &SeenUrlSet, newly_posted: I) -> SeenUrlSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged = existing.clone();
        merged.extend(newly_posted);
        merged.truncate_front(self.cap);

        if let Err(e) = self.write(&merged) {
            tracing::warn!(error = ?e, path = %self.path.display(), "failed to save seen urls");
        }
        merged
    }

    // Write to a sibling temp file, then rename over the target.
    fn write(&self, set: &SeenUrlSet) -> Result<()> {
        let json = serde_json::to_string_pretty(&set.urls).context("serializing seen urls")?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

/// Every `](http…)` link target in rendered MarkdownV2, in order.
pub fn extract_link_targets(text: &str) -> Vec<String> {
    static RE_LINK: OnceCell<Regex> = OnceCell::new();
    let re = RE_LINK.get_or_init(|| Regex::new(r"\]\((https?://[^)\s]+)\)").expect("link regex"));
    re.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
