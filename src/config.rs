//! Run configuration resolved once from the command line.

use crate::cli::Cli;
use crate::transport::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub output: PathBuf,
    pub sites_file: Option<PathBuf>,
    pub only: Vec<String>,
    pub max_links: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub request_delay: Duration,
    pub concurrency: usize,
    pub render_proxy: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./data/raw/data.csv"),
            sites_file: None,
            only: Vec::new(),
            max_links: 100,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            request_delay: Duration::from_millis(500),
            concurrency: 1,
            render_proxy: "https://r.jina.ai/".to_string(),
        }
    }
}

impl From<&Cli> for CrawlConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            output: PathBuf::from(&cli.output),
            sites_file: cli.sites.as_ref().map(PathBuf::from),
            only: cli.only.clone(),
            max_links: cli.max_links,
            timeout: Duration::from_secs(cli.timeout_secs),
            retry: RetryPolicy {
                retries: cli.retries,
                backoff_factor: cli.backoff_factor.max(0.0),
            },
            request_delay: Duration::from_millis(cli.request_delay_ms),
            concurrency: cli.concurrency.max(1),
            render_proxy: cli.render_proxy.clone(),
        }
    }
}
