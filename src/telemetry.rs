//! Logging and metric descriptors shared by the binary and the pipeline stages.

use metrics::describe_counter;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "digest_bot=info,warn";

/// Compact human-readable logs; `RUST_LOG` overrides the default filter.
/// Safe to call twice (the second install is ignored).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .try_init();
}

/// Register counter descriptions once per process.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_items_fetched_total",
            "Items returned by all providers in one run."
        );
        describe_counter!(
            "digest_provider_errors_total",
            "Provider fetches that failed and were skipped."
        );
        describe_counter!(
            "digest_items_stale_total",
            "Items dropped by the recency window."
        );
        describe_counter!(
            "digest_generation_retries_total",
            "Rate-limited generation attempts that were retried."
        );
        describe_counter!(
            "digest_chunks_sent_total",
            "Telegram message chunks accepted by the API."
        );
        describe_counter!(
            "digest_chunks_failed_total",
            "Telegram message chunks that could not be delivered."
        );
    });
}
