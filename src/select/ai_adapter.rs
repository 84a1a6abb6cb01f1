//! Generation service abstraction: the Gemini `generateContent` client plus a scripted mock.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SelectionConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Quota hit (HTTP 429 or `RESOURCE_EXHAUSTED`). The only retryable kind.
    #[error("generation rate limited")]
    RateLimited,
    #[error("generation API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation returned no text")]
    EmptyResponse,
}

/// Anything that turns a prompt into raw response text.
pub trait GenerationService: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &SelectionConfig, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building gemini http client")?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            cfg.api_base.trim_end_matches('/'),
            cfg.model
        );
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn generate_impl(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 || body.contains("RESOURCE_EXHAUSTED") {
                return Err(GenerationError::RateLimited);
            }
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

impl GenerationService for GeminiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(self.generate_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Replays scripted replies in order, then repeats `fallback` (or `EmptyResponse`).
/// Records every prompt it receives.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn scripted(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_reply(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or(GenerationError::EmptyResponse),
        }
    }
}

impl GenerationService for MockGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        let out = self.next_reply(prompt);
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_model_and_base() {
        let cfg = SelectionConfig {
            api_base: "http://127.0.0.1:9999/".into(),
            ..SelectionConfig::default()
        };
        let c = GeminiClient::new(&cfg, "k").unwrap();
        assert_eq!(
            c.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn mock_replays_script_then_fallback() {
        let m = MockGenerator {
            fallback: Some("{}".into()),
            ..MockGenerator::scripted(vec![Err(GenerationError::RateLimited)])
        };
        assert_eq!(m.generate("p1").await, Err(GenerationError::RateLimited));
        assert_eq!(m.generate("p2").await.unwrap(), "{}");
        assert_eq!(m.prompts(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn exhausted_script_without_fallback_is_empty() {
        let m = MockGenerator::scripted(vec![]);
        assert_eq!(m.generate("p").await, Err(GenerationError::EmptyResponse));
        assert_eq!(m.calls(), 1);
    }
}
