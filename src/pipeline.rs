//! The crawl run: discover, fetch, number, merge, write.
//!
//! # Run Sequence
//!
//! 1. Load the prior dataset (highest id = `M`)
//! 2. Crawl every registered site, up to `concurrency` sites at a time
//! 3. Number new articles `M+1, M+2, ...` in site order, then discovery order
//! 4. Write prior rows followed by the new ones
//!
//! Site workers share only the fetcher. Numbering happens afterwards on a
//! single accumulator, so ids do not depend on which site finished first.

use crate::config::CrawlConfig;
use crate::discovery::discover_links;
use crate::error::StoreError;
use crate::models::{ArticlePayload, ArticleRecord, SiteDescriptor, StoredRow};
use crate::orchestrator::FetchOrchestrator;
use crate::outputs::dataset::DatasetStore;
use crate::registry::Registry;
use crate::transport::Fetcher;
use crate::urls::{is_valid_url, strip_tracking_params};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tokio::time::sleep;
use tracing::{info, instrument};

/// What one site produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOutcome {
    pub site: String,
    /// Candidate URLs sent through the fetch chain.
    pub attempted: usize,
    /// Accepted articles, in discovery order.
    pub payloads: Vec<ArticlePayload>,
}

/// Crawl one site to exhaustion.
///
/// Never fails: a site with no links, or whose every URL is skipped, yields
/// an empty outcome.
#[instrument(level = "info", skip_all, fields(site = %site.name))]
pub async fn crawl_site<F: Fetcher>(
    fetcher: &F,
    site: &SiteDescriptor,
    config: &CrawlConfig,
) -> SiteOutcome {
    info!("=== {} ===", site.name.to_uppercase());

    let links: Vec<String> = discover_links(fetcher, site, config.max_links)
        .await
        .into_iter()
        .filter(|u| is_valid_url(u))
        .map(|u| strip_tracking_params(&u))
        .unique()
        .take(config.max_links)
        .collect();
    info!(count = links.len(), "Found links");

    let orchestrator = FetchOrchestrator::new(fetcher, &config.render_proxy);
    let mut payloads = Vec::new();
    for url in &links {
        match orchestrator.fetch_article(url).await {
            Ok(payload) => {
                info!(
                    url = %payload.url,
                    title = %truncate_for_log(&payload.title, 80),
                    secs = payload.t_total_sec,
                    "ok"
                );
                payloads.push(payload);
            }
            Err(reason) => info!(%url, %reason, "skip"),
        }
        if !config.request_delay.is_zero() {
            sleep(config.request_delay).await;
        }
    }

    SiteOutcome {
        site: site.name.clone(),
        attempted: links.len(),
        payloads,
    }
}

/// Crawl every site in the registry. Outcomes come back in registry order
/// whatever the concurrency.
pub async fn crawl_all<F: Fetcher>(
    fetcher: &F,
    registry: &Registry,
    config: &CrawlConfig,
) -> Vec<SiteOutcome> {
    stream::iter(registry.iter())
        .map(|site| crawl_site(fetcher, site, config))
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}

/// Single writer for new records; hands out ids in push order.
#[derive(Debug)]
pub struct Accumulator {
    /// `None` once `u64::MAX` has been handed out.
    next_id: Option<u64>,
    records: Vec<ArticleRecord>,
}

impl Accumulator {
    /// Start numbering at `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: Some(first_id),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, source: &str, payload: ArticlePayload) -> Result<u64, StoreError> {
        let id = self.next_id.ok_or(StoreError::IdsExhausted { max_id: u64::MAX })?;
        self.records.push(ArticleRecord::new(id, source, payload));
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    pub fn absorb(&mut self, outcome: SiteOutcome) -> Result<(), StoreError> {
        for payload in outcome.payloads {
            self.push(&outcome.site, payload)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }
}

/// Per-site tallies for the end-of-run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTally {
    pub site: String,
    pub ok: usize,
    pub attempted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub prior_rows: usize,
    pub new_rows: usize,
    pub sites: Vec<SiteTally>,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.prior_rows + self.new_rows
    }

    pub fn log(&self) {
        for tally in &self.sites {
            info!(site = %tally.site, ok = tally.ok, attempted = tally.attempted, "Site summary");
        }
        info!(
            prior = self.prior_rows,
            new = self.new_rows,
            total = self.total_rows(),
            "Merged dataset"
        );
    }
}

/// Load, crawl, merge, and write.
///
/// Fails only on persistence: a prior dataset that exists but cannot be read,
/// or whose ids leave no room for new ones, aborts before any request is
/// made, and a failed final write is returned to the caller.
#[instrument(
    level = "info",
    skip_all,
    fields(path = %store.path().display(), sites = registry.len())
)]
pub async fn run<F: Fetcher>(
    fetcher: &F,
    registry: &Registry,
    config: &CrawlConfig,
    store: &DatasetStore,
) -> Result<RunSummary, StoreError> {
    let prior = store.load_existing().await?;
    let first_id = prior.next_id().ok_or(StoreError::IdsExhausted {
        max_id: prior.max_id,
    })?;
    let mut accumulator = Accumulator::starting_at(first_id);

    let outcomes = crawl_all(fetcher, registry, config).await;
    let sites = outcomes
        .iter()
        .map(|o| SiteTally {
            site: o.site.clone(),
            ok: o.payloads.len(),
            attempted: o.attempted,
        })
        .collect();
    for outcome in outcomes {
        accumulator.absorb(outcome)?;
    }

    let summary = RunSummary {
        prior_rows: prior.rows.len(),
        new_rows: accumulator.len(),
        sites,
    };

    let mut rows = prior.rows;
    rows.extend(accumulator.into_records().into_iter().map(StoredRow::from));
    store.save(&rows).await?;

    Ok(summary)
}
