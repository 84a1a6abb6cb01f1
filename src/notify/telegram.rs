use super::{ChatSender, ParseMode, SendError};
use crate::config::{DeliveryConfig, Secrets};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Telegram Bot API `sendMessage`.
#[derive(Clone)]
pub struct TelegramSender {
    endpoint: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl TelegramSender {
    pub fn new(api_base: &str, token: &str, chat_id: &str) -> Self {
        Self {
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn from_config(cfg: &DeliveryConfig, secrets: &Secrets) -> Self {
        Self::new(&cfg.api_base, &secrets.telegram_token, &secrets.telegram_chat_id)
            .with_timeout(cfg.timeout_secs)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send(&self, text: &str, mode: ParseMode) -> Result<(), SendError> {
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text,
            parse_mode: match mode {
                ParseMode::MarkdownV2 => Some("MarkdownV2"),
                ParseMode::Plain => None,
            },
            disable_web_page_preview: true,
        };

        let rsp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            // without_url: the endpoint carries the bot token
            .map_err(|e| SendError::Transport(e.without_url().to_string()))?;

        let status = rsp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = rsp.text().await.unwrap_or_default();
        if body.contains("can't parse entities") {
            return Err(SendError::MarkupRejected(body));
        }
        Err(SendError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}
