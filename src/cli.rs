//! Command-line interface definitions for newsharvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for a crawl run.
///
/// Defaults reproduce the polite sequential crawl: 5 s timeouts, two retries,
/// half a second between requests to the same outlet, one site at a time.
///
/// # Examples
///
/// ```sh
/// # Crawl every built-in outlet into the default dataset
/// newsharvest
///
/// # Crawl two outlets into a custom file
/// newsharvest -o ./out/articles.csv --only bbc --only tass
///
/// # Use a site file and four site workers
/// newsharvest -s ./sites.yaml --concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Dataset CSV to load and rewrite
    #[arg(short, long, env = "NEWSHARVEST_OUTPUT", default_value = "./data/raw/data.csv")]
    pub output: String,

    /// Optional YAML site file replacing the built-in registry
    #[arg(short, long, env = "NEWSHARVEST_SITES")]
    pub sites: Option<String>,

    /// Only crawl the named site (repeatable)
    #[arg(long)]
    pub only: Vec<String>,

    /// Maximum candidate links per site
    #[arg(long, default_value_t = 100)]
    pub max_links: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    /// Retries on 429/5xx and connection failures
    #[arg(long, default_value_t = 2)]
    pub retries: u32,

    /// Exponential backoff factor in seconds
    #[arg(long, default_value_t = 0.5)]
    pub backoff_factor: f64,

    /// Minimum delay between requests to the same host, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub request_delay_ms: u64,

    /// Number of sites crawled at once
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Text-rendering proxy prefix used as the last fetch fallback
    #[arg(long, env = "NEWSHARVEST_RENDER_PROXY", default_value = "https://r.jina.ai/")]
    pub render_proxy: String,
}
