// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod format;
pub mod history;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod select;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{Category, Mode, NewsItem};
pub use crate::pipeline::{Pipeline, RunOutcome};
