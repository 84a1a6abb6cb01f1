pub mod chunk;
pub mod telegram;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;

use crate::format::unescape_markdown_v2;
use chunk::split_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
    Plain,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    /// The chat API could not parse the markup ("can't parse entities").
    #[error("markup rejected: {0}")]
    MarkupRejected(String),
    #[error("chat API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("chat transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, text: &str, mode: ParseMode) -> Result<(), SendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub index: usize,
    pub text: String,
    pub sent: bool,
    /// Delivered only after resending without markup.
    pub plain_fallback: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks: Vec<ChunkOutcome>,
}

impl DeliveryReport {
    pub fn all_sent(&self) -> bool {
        self.chunks.iter().all(|c| c.sent)
    }

    pub fn any_sent(&self) -> bool {
        self.chunks.iter().any(|c| c.sent)
    }

    /// Texts of the chunks the chat API accepted, in order.
    pub fn sent_chunks(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().filter(|c| c.sent).map(|c| c.text.as_str())
    }

    pub fn failed_count(&self) -> usize {
        self.chunks.iter().filter(|c| !c.sent).count()
    }
}

/// Split and send in order. A failed chunk is recorded and the rest still go out.
pub async fn deliver(sender: &dyn ChatSender, text: &str, max_chars: usize) -> DeliveryReport {
    let parts = split_message(text, max_chars);
    let total = parts.len();
    if total > 1 {
        tracing::info!(chars = text.chars().count(), chunks = total, "splitting message");
    }

    let mut report = DeliveryReport::default();
    for (index, part) in parts.into_iter().enumerate() {
        if part.trim().is_empty() {
            continue;
        }
        let outcome = send_chunk(sender, index, part).await;
        if outcome.sent {
            counter!("digest_chunks_sent_total").increment(1);
            tracing::info!(part = index + 1, total, plain = outcome.plain_fallback, "chunk sent");
        } else {
            counter!("digest_chunks_failed_total").increment(1);
            tracing::error!(part = index + 1, total, error = ?outcome.error, "chunk failed");
        }
        report.chunks.push(outcome);
    }
    report
}

async fn send_chunk(sender: &dyn ChatSender, index: usize, text: String) -> ChunkOutcome {
    let first = sender.send(&text, ParseMode::MarkdownV2).await;
    let (result, plain_fallback) = match first {
        Err(SendError::MarkupRejected(reason)) => {
            tracing::warn!(part = index + 1, %reason, "markup rejected, resending as plain text");
            let plain = unescape_markdown_v2(&text);
            (sender.send(&plain, ParseMode::Plain).await, true)
        }
        other => (other, false),
    };
    ChunkOutcome {
        index,
        sent: result.is_ok(),
        plain_fallback,
        error: result.err().map(|e| e.to_string()),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Accepts everything except texts containing `reject_marker` (as markup) or `fail_marker`.
    #[derive(Default)]
    struct ScriptedSender {
        reject_marker: Option<&'static str>,
        fail_marker: Option<&'static str>,
        sent: Mutex<Vec<(String, ParseMode)>>,
    }

    #[async_trait]
    impl ChatSender for ScriptedSender {
        async fn send(&self, text: &str, mode: ParseMode) -> Result<(), SendError> {
            self.sent.lock().unwrap().push((text.to_string(), mode));
            if let Some(m) = self.fail_marker {
                if text.contains(m) {
                    return Err(SendError::Api {
                        status: 400,
                        body: "chat not found".into(),
                    });
                }
            }
            if let Some(m) = self.reject_marker {
                if mode == ParseMode::MarkdownV2 && text.contains(m) {
                    return Err(SendError::MarkupRejected("can't parse entities".into()));
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn markup_rejection_resends_plain() {
        let sender = ScriptedSender {
            reject_marker: Some("bad"),
            ..ScriptedSender::default()
        };
        let report = deliver(&sender, "bad \\*markup\\*", 4000).await;
        assert!(report.all_sent());
        assert!(report.chunks[0].plain_fallback);
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[1], ("bad *markup*".to_string(), ParseMode::Plain));
    }

    #[tokio::test]
    async fn failed_chunk_does_not_stop_the_rest() {
        let sender = ScriptedSender {
            fail_marker: Some("AAAA"),
            ..ScriptedSender::default()
        };
        let text = format!("{}\n\n{}", "A".repeat(30), "B".repeat(30));
        let report = deliver(&sender, &text, 40).await;
        assert_eq!(report.chunks.len(), 2);
        assert!(!report.all_sent());
        assert!(report.any_sent());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.sent_chunks().collect::<Vec<_>>(), vec!["B".repeat(30)]);
        assert!(report.chunks[0].error.as_deref().unwrap().contains("chat not found"));
    }

    #[tokio::test]
    async fn blank_chunks_are_skipped() {
        let sender = ScriptedSender::default();
        let report = deliver(&sender, "   ", 4000).await;
        assert!(report.chunks.is_empty());
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
