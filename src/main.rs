//! # newsharvest
//!
//! A crawl-and-extract pipeline that collects news articles from dozens of
//! outlets (English, Arabic, Russian) into one cumulative CSV dataset.
//!
//! ## Features
//!
//! - RSS/Atom-first link discovery with an HTML listing-page fallback
//! - URL normalization, tracking-parameter stripping, and a social/legal denylist
//! - Multi-stage fetch chain: AMP variant, direct page, third-party render proxy
//! - Layered article classifier (Open Graph, JSON-LD, page structure, outlet overrides)
//! - Paragraph extraction with boilerplate filtering
//! - Merge-on-load persistence with identifiers that keep counting across runs
//!
//! ## Usage
//!
//! ```sh
//! newsharvest -o ./data/raw/data.csv
//! RUST_LOG=newsharvest=debug newsharvest --only bbc --only cnn
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Loading**: Read the prior dataset to find the highest identifier
//! 2. **Discovery**: Collect up to 100 candidate article URLs per site
//! 3. **Fetching**: Run each candidate through the fetch chain, classify, extract
//! 4. **Output**: Number the new articles and rewrite the full dataset

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classifier;
mod cli;
mod config;
mod discovery;
mod error;
mod extractor;
mod models;
mod orchestrator;
mod outlets;
mod outputs;
mod pipeline;
mod registry;
mod transport;
mod urls;
mod utils;

use cli::Cli;
use config::CrawlConfig;
use outputs::dataset::DatasetStore;
use registry::Registry;
use transport::{HttpFetcher, RetryFetch};
use utils::ensure_writable_parent;

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
    info!("newsharvest starting up");

    let args = Cli::parse();
    let config = CrawlConfig::from(&args);
    debug!(?config, "Resolved configuration");

    // ---- Site registry ----
    let registry = match &config.sites_file {
        Some(path) => Registry::from_yaml_file(path).await?,
        None => Registry::builtin(),
    }
    .only(&config.only);
    if registry.is_empty() {
        error!(only = ?config.only, "No sites left to crawl");
        return Err("no sites selected".into());
    }
    info!(sites = registry.len(), "Site registry ready");

    // Early check: the dataset directory must be writable before hours of crawling
    if let Err(e) = ensure_writable_parent(&config.output).await {
        error!(
            path = %config.output.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let fetcher = RetryFetch::new(HttpFetcher::new(&config)?, config.retry);
    let store = DatasetStore::new(&config.output);

    let summary = match pipeline::run(&fetcher, &registry, &config, &store).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e.into());
        }
    };
    summary.log();

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
