//! Outbound HTTP with retry, backoff, per-domain headers, and per-host pacing.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the pipeline never talks to
//! `reqwest` directly:
//! - [`Fetcher`]: Core trait, one GET returning status, content type, and body
//! - [`HttpFetcher`]: `reqwest` implementation with connection reuse, a fixed
//!   timeout, and a keyed per-host rate limiter
//! - [`RetryFetch`]: Decorator that adds the retry policy to any `Fetcher`
//!
//! # Retry Strategy
//!
//! - Retries on status 429/500/502/503/504 and on connect/timeout failures
//! - At most `retries` extra attempts (2 by default)
//! - Exponential backoff: first retry immediate, then `factor * 2^(n-1)` seconds, capped at 30s
//! - Random jitter (0-250ms) added to every wait
//! - Exhausted status retries hand back the last response, not an error

use crate::config::CrawlConfig;
use crate::error::FetchError;
use crate::outlets;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, PRAGMA, REFERER,
    USER_AGENT,
};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DESKTOP_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/128.0.0.0 Safari/537.36"
);

pub const MOBILE_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Linux; Android 12; SM-G991B) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/128.0.0.0 Mobile Safari/537.36"
);

const GOOGLE_NEWS_REFERER: &str = "https://news.google.com/";

/// Statuses that trigger a retry.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Which header set a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// The static desktop header set.
    Desktop,
    /// Desktop headers with per-domain overrides applied for the request URL.
    Domain,
}

/// The static desktop header set sent with every request.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Default headers, with a mobile user-agent and a Google News referer for
/// outlets that gate desktop traffic.
pub fn domain_headers(url: &str) -> HeaderMap {
    let mut headers = default_headers();
    if outlets::wants_mobile_profile(url) {
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(GOOGLE_NEWS_REFERER));
    }
    headers
}

/// A response as seen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Trait for a single outbound GET.
///
/// Implementors return `Ok` for any HTTP response, whatever its status, and
/// `Err` only when no response was obtained.
pub trait Fetcher {
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchedPage, FetchError>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: Client,
    /// One request per `request_delay` per [`pace_key`]; absent when the delay is zero.
    limiter: Option<DefaultKeyedRateLimiter<String>>,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let limiter = Quota::with_period(config.request_delay).map(RateLimiter::keyed);
        Ok(Self { client, limiter })
    }
}

/// Rate-limit key: lowercase host, plus the port when one is spelled out.
fn pace_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url, ?profile))]
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&pace_key(&parsed)).await;
        }

        let headers = match profile {
            HeaderProfile::Desktop => default_headers(),
            HeaderProfile::Domain => domain_headers(url),
        };

        let t0 = Instant::now();
        let response = self.client.get(parsed).headers(headers).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = response.url().to_string();
        let body = response.text().await?;

        debug!(
            status,
            %final_url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET complete"
        );
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub retries: u32,
    /// Seconds; see [`RetryPolicy::backoff`].
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Wait before the `retry`-th retry (1-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exp = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exp))
            .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
    }
}

/// Wrapper that adds the [`RetryPolicy`] to any [`Fetcher`].
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Fetcher> RetryFetch<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("retries", &self.policy.retries)
            .field("backoff_factor", &self.policy.backoff_factor)
            .finish()
    }
}

impl<T: Fetcher> Fetcher for RetryFetch<T> {
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchedPage, FetchError> {
        let mut retry = 0u32;
        loop {
            let outcome = self.inner.get(url, profile).await;
            let retryable = match &outcome {
                Ok(page) => RETRY_STATUSES.contains(&page.status),
                Err(e) => e.is_transient(),
            };
            if !retryable || retry >= self.policy.retries {
                return outcome;
            }

            retry += 1;
            let jitter_ms: u64 = rng().random_range(0..=250);
            let delay = self.policy.backoff(retry) + Duration::from_millis(jitter_ms);
            match &outcome {
                Ok(page) => warn!(
                    %url,
                    status = page.status,
                    retry,
                    ?delay,
                    "Retryable status; backing off"
                ),
                Err(e) => warn!(%url, error = %e, retry, ?delay, "Transient failure; backing off"),
            }
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory [`Fetcher`] for network-free tests.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    enum Reply {
        Page(FetchedPage),
        Fail(&'static str),
    }

    /// Serves canned replies per URL. A URL with several queued replies
    /// serves them in order and then keeps repeating the last one; unknown
    /// URLs get an empty 404.
    #[derive(Default)]
    pub struct FakeFetcher {
        routes: Mutex<HashMap<String, VecDeque<Reply>>>,
        pub calls: Mutex<Vec<(String, HeaderProfile)>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
            self.push(
                url,
                Reply::Page(FetchedPage {
                    status,
                    content_type: Some(content_type.to_string()),
                    body: body.to_string(),
                }),
            )
        }

        pub fn html(self, url: &str, body: &str) -> Self {
            self.page(url, 200, "text/html; charset=utf-8", body)
        }

        pub fn xml(self, url: &str, body: &str) -> Self {
            self.page(url, 200, "application/rss+xml", body)
        }

        pub fn fail(self, url: &str, message: &'static str) -> Self {
            self.push(url, Reply::Fail(message))
        }

        fn push(self, url: &str, reply: Reply) -> Self {
            self.routes
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        pub fn called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }
    }

    impl Fetcher for FakeFetcher {
        async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchedPage, FetchError> {
            self.calls.lock().unwrap().push((url.to_string(), profile));
            let mut routes = self.routes.lock().unwrap();
            let Some(queue) = routes.get_mut(url) else {
                return Ok(FetchedPage {
                    status: 404,
                    content_type: Some("text/html".to_string()),
                    body: String::new(),
                });
            };
            let reply = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                match queue.front().unwrap() {
                    Reply::Page(p) => Reply::Page(p.clone()),
                    Reply::Fail(m) => Reply::Fail(*m),
                }
            };
            match reply {
                Reply::Page(p) => Ok(p),
                Reply::Fail(m) => Err(FetchError::Connect(m.to_string())),
            }
        }
    }
}
