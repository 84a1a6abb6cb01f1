//! digest-bot: one-shot entrypoint.
//! Fetches, curates and posts a single digest, then exits. Scheduling is left to cron
//! or whatever invokes the binary.

use anyhow::{Context, Result};
use digest_bot::config::{DigestConfig, Secrets};
use digest_bot::telemetry::init_tracing;
use digest_bot::{Mode, Pipeline, RunOutcome};

const ENV_MODE: &str = "DIGEST_MODE";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mode: Mode = std::env::var(ENV_MODE)
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("invalid {ENV_MODE}"))?;
    let cfg = DigestConfig::load_default()?;
    let secrets = Secrets::from_env()?;
    tracing::debug!(?secrets, "secrets loaded");

    let pipeline = Pipeline::from_config(cfg, &secrets)?;
    match pipeline.run_once(mode, chrono::Utc::now()).await {
        RunOutcome::Delivered { report, saved_urls } if report.all_sent() => {
            tracing::info!(chunks = report.chunks.len(), saved = saved_urls.len(), "digest posted");
        }
        RunOutcome::Delivered { report, .. } => {
            tracing::warn!(
                failed = report.failed_count(),
                total = report.chunks.len(),
                "digest only partly posted"
            );
        }
        other => tracing::info!(outcome = ?other, "run finished without posting"),
    }
    Ok(())
}
