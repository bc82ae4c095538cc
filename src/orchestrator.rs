//! Per-URL fetch chain.
//!
//! A candidate URL goes through these stages in order, stopping at the first
//! page that classifies as an article and yields both a title and a body:
//!
//! 1. **Reject**: invalid URLs and known non-article paths, no network call
//! 2. **AMP variant**: outlets that publish AMP pages; the AMP URL becomes canonical
//! 3. **Direct**: the URL itself; requires HTTP 200 and an HTML content type
//! 4. **Render proxy**: the URL through a text-rendering proxy; the original URL stays canonical
//!
//! If every stage fails the URL is dropped for this run with a [`SkipReason`].

use crate::classifier::classify;
use crate::extractor::extract;
use crate::models::ArticlePayload;
use crate::outlets;
use crate::transport::{Fetcher, HeaderProfile};
use crate::urls::is_valid_url;
use chrono::Utc;
use scraper::Html;
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument};

/// Why a candidate URL produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUrl,
    NonArticlePath,
    /// Direct fetch answered with this status but nothing in the chain
    /// produced an article.
    BadStatusOrContentType(u16),
    /// The direct fetch failed outright and no fallback recovered.
    Exception(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "invalid-url"),
            Self::NonArticlePath => write!(f, "non-article-path"),
            Self::BadStatusOrContentType(status) => {
                write!(f, "bad-status-or-content-type({status})")
            }
            Self::Exception(kind) => write!(f, "exception({kind})"),
        }
    }
}

/// Runs the fetch chain against a [`Fetcher`].
pub struct FetchOrchestrator<'a, F> {
    fetcher: &'a F,
    render_proxy: &'a str,
}

impl<'a, F: Fetcher> FetchOrchestrator<'a, F> {
    pub fn new(fetcher: &'a F, render_proxy: &'a str) -> Self {
        Self {
            fetcher,
            render_proxy,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_article(&self, url: &str) -> Result<ArticlePayload, SkipReason> {
        let started = Instant::now();

        if !is_valid_url(url) {
            return Err(SkipReason::InvalidUrl);
        }
        if outlets::is_non_article_path(url) {
            return Err(SkipReason::NonArticlePath);
        }

        if let Some(amp_url) = outlets::amp_variant(url) {
            match self.fetcher.get(&amp_url, HeaderProfile::Domain).await {
                Ok(page) if page.is_ok() && page.is_html() => {
                    if let Some(payload) = evaluate(&page.body, &amp_url, &amp_url, started) {
                        debug!(%amp_url, "Accepted AMP variant");
                        return Ok(payload);
                    }
                }
                Ok(page) => debug!(%amp_url, status = page.status, "AMP variant unusable"),
                Err(e) => debug!(%amp_url, error = %e, "AMP variant request failed"),
            }
        }

        let direct_failure = match self.fetcher.get(url, HeaderProfile::Domain).await {
            Ok(page) => {
                if page.is_ok() && page.is_html() {
                    if let Some(payload) = evaluate(&page.body, url, url, started) {
                        return Ok(payload);
                    }
                }
                SkipReason::BadStatusOrContentType(page.status)
            }
            Err(e) => {
                debug!(error = %e, "Direct request failed");
                SkipReason::Exception(e.kind())
            }
        };

        let proxied = format!("{}{}", self.render_proxy, url);
        match self.fetcher.get(&proxied, HeaderProfile::Desktop).await {
            Ok(page) if page.is_ok() => {
                if let Some(payload) = evaluate(&page.body, url, url, started) {
                    debug!("Accepted render-proxy copy");
                    return Ok(payload);
                }
            }
            Ok(page) => debug!(status = page.status, "Render proxy unusable"),
            Err(e) => debug!(error = %e, "Render proxy request failed"),
        }

        Err(direct_failure)
    }
}

/// Classify and extract one fetched body. `classify_url` drives outlet
/// overrides; `canonical_url` is what the record will carry.
fn evaluate(
    body: &str,
    classify_url: &str,
    canonical_url: &str,
    started: Instant,
) -> Option<ArticlePayload> {
    let doc = Html::parse_document(body);
    let signal = classify(&doc, Some(classify_url))?;
    let extracted = extract(&doc)?;
    debug!(signal, url = canonical_url, "Page accepted as article");

    Some(ArticlePayload {
        url: canonical_url.to_string(),
        title: extracted.title,
        content: extracted.content,
        fetched_at: Utc::now(),
        t_total_sec: round_millis(started.elapsed().as_secs_f64()),
        h1: extracted.h1,
        h2: extracted.h2,
    })
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
