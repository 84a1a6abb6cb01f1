// src/select/retry.rs
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::RetryConfig;

/// Linear backoff: the wait after attempt `i` (0-based) is `backoff_step * (i + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            backoff_step: Duration::from_secs(cfg.backoff_secs),
        }
    }

    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt_index.saturating_add(1))
    }

    /// Whether another attempt may follow attempt `attempt_index`.
    pub fn can_retry(&self, attempt_index: u32) -> bool {
        attempt_index + 1 < self.max_attempts
    }
}

/// Abstracts the wait between attempts so tests do not sleep for real.
pub trait Sleeper: Send + Sync {
    fn sleep<'a>(&'a self, dur: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, dur: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(dur))
    }
}

/// Returns immediately and remembers every requested delay.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep<'a>(&'a self, dur: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        if let Ok(mut g) = self.slept.lock() {
            g.push(dur);
        }
        Box::pin(async {})
    }
}
