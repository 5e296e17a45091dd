//! # Finance News AI
//!
//! Scrapes a finance news listing page, enriches every article with an
//! LLM-generated summary, a sentiment label and the organizations, places,
//! amounts and people it mentions, then writes the batch as a CSV table plus a
//! sentiment bar chart.
//!
//! ## Usage
//!
//! ```sh
//! finance_news_ai -o ~/Desktop
//! finance_news_ai -c run.yaml --concurrency 8
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one pass over the listing page yields raw `(title, summary)` pairs
//! 2. **Enrichment**: each article is shortened, summarized, scored and tagged,
//!    several at a time; failures skip only that article
//! 3. **Output**: the CSV table (fatal on failure) and the chart (warning on failure)

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod services;
mod title;
mod utils;

use cli::Cli;
use config::PipelineConfig;
use pipeline::{EnrichmentContext, EnrichmentSettings};
use scrapers::SourceProvider;
use scrapers::moneycontrol::Moneycontrol;
use services::llm::LlmServices;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let run_at = Local::now();
    info!("finance_news_ai starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = PipelineConfig::resolve(&args)?;
    debug!(?config, "Resolved pipeline configuration");

    // Early check: fail before spending model calls on an unwritable target
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Enrichment services (loaded once, shared by every article) ----
    let services = LlmServices::load(&config).await?;
    let context = EnrichmentContext::new(
        services.summarizer,
        services.sentiment,
        services.entities,
        EnrichmentSettings::from(&config),
    );

    // ---- Fetch listing ----
    let source = Moneycontrol::new(&config.source_url, &config.user_agent)?;
    let raw_articles = source.fetch_articles().await?;
    info!(count = raw_articles.len(), "Found articles");

    // ---- Enrich ----
    info!(
        concurrency = context.settings().concurrency,
        "Starting article enrichment"
    );
    let outcome = context.enrich_all(raw_articles).await;

    // ---- Outputs ----
    let written = outputs::write_outputs(&outcome.articles, &config.output_dir, &run_at)?;

    let chart_display = written
        .chart
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let elapsed = start_time.elapsed();
    info!(
        found = outcome.found,
        processed = outcome.articles.len(),
        skipped = outcome.skipped(),
        missing_field = outcome.skipped_missing_field,
        enrichment_failed = outcome.skipped_enrichment_failed,
        table = %written.table.display(),
        chart = %chart_display,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
