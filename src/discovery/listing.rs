//! Listing-page link harvesting.

use crate::models::SiteDescriptor;
use crate::transport::{Fetcher, HeaderProfile};
use crate::urls::{normalize_url, should_skip_url};
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Select anchors on the site's listing page with its link selector.
///
/// At most `2 * max_links` raw hits are gathered before de-duplication, then
/// the list is cut to `max_links`. Request failures and non-2xx statuses
/// yield an empty list.
#[instrument(level = "info", skip_all, fields(site = %site.name, url = %site.listing_url))]
pub async fn links_from_listing<F: Fetcher>(
    fetcher: &F,
    site: &SiteDescriptor,
    max_links: usize,
) -> Vec<String> {
    let page = match fetcher.get(&site.listing_url, HeaderProfile::Domain).await {
        Ok(page) if page.is_success() => page,
        Ok(page) => {
            warn!(status = page.status, "Listing page returned an error status");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Listing page request failed");
            return Vec::new();
        }
    };

    let selector = match Selector::parse(&site.link_selector) {
        Ok(selector) => selector,
        Err(e) => {
            warn!(selector = %site.link_selector, error = %e, "Invalid link selector");
            return Vec::new();
        }
    };

    let links = harvest(&page.body, &selector, &site.base_url, max_links);
    debug!(count = links.len(), "Harvested listing links");
    links
}

fn harvest(html: &str, selector: &Selector, base_url: &str, max_links: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| normalize_url(base_url, href))
        .filter(|u| !should_skip_url(u))
        .take(max_links.saturating_mul(2))
        .unique()
        .take(max_links)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeFetcher;

    fn site(selector: &str) -> SiteDescriptor {
        SiteDescriptor::new(
            "mock",
            "https://mock.example/world",
            "https://mock.example",
            selector,
            &[],
        )
    }

    #[tokio::test]
    async fn test_listing_returns_valid_links_in_document_order() {
        let html = r#"<html><body>
            <a class="story" href="/world/2025/05/06/first-story">First</a>
            <a class="story" href="/login">Sign in</a>
            <a class="story" href="https://mock.example/world/2025/05/06/second-story?fbclid=zz">Second</a>
        </body></html>"#;
        let fetcher = FakeFetcher::new().html("https://mock.example/world", html);

        let links = links_from_listing(&fetcher, &site("a.story"), 100).await;
        assert_eq!(
            links,
            vec![
                "https://mock.example/world/2025/05/06/first-story",
                "https://mock.example/world/2025/05/06/second-story",
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_only_uses_selected_anchors() {
        let html = r#"<a class="nav" href="/about">About</a><a class="story" href="/x">X</a>"#;
        let fetcher = FakeFetcher::new().html("https://mock.example/world", html);

        let links = links_from_listing(&fetcher, &site("a.story"), 100).await;
        assert_eq!(links, vec!["https://mock.example/x"]);
    }

    #[tokio::test]
    async fn test_listing_caps_and_dedups() {
        let anchors: String = (0..300)
            .map(|i| format!(r#"<a href="/s/{}">s</a>"#, i / 2))
            .collect();
        let fetcher = FakeFetcher::new().html("https://mock.example/world", &anchors);

        let links = links_from_listing(&fetcher, &site("a"), 100).await;
        assert_eq!(links.len(), 100);
        assert_eq!(links.iter().unique().count(), 100);
        assert_eq!(links[0], "https://mock.example/s/0");
    }

    #[tokio::test]
    async fn test_listing_failures_are_empty() {
        let failing = FakeFetcher::new().fail("https://mock.example/world", "timeout");
        assert!(links_from_listing(&failing, &site("a"), 100).await.is_empty());

        let missing = FakeFetcher::new();
        assert!(links_from_listing(&missing, &site("a"), 100).await.is_empty());

        let ok = FakeFetcher::new().html("https://mock.example/world", r#"<a href="/x">x</a>"#);
        assert!(links_from_listing(&ok, &site("a[[["), 100).await.is_empty());
    }
}
