//! Candidate link discovery for a site.
//!
//! Each site is tried with two strategies in priority order; the first one
//! that yields any links wins:
//!
//! 1. **Feeds** ([`feed`]): every configured RSS/Atom URL, in order
//! 2. **Listing** ([`listing`]): anchors picked from the listing page by the site's selector
//!
//! # Contract
//!
//! The returned list holds only valid, non-skippable, de-duplicated absolute
//! URLs, at most `max_links` of them, in feed/document order.

pub mod feed;
pub mod listing;

use crate::models::SiteDescriptor;
use crate::transport::Fetcher;
use tracing::{info, instrument};

#[instrument(level = "info", skip_all, fields(site = %site.name))]
pub async fn discover_links<F: Fetcher>(
    fetcher: &F,
    site: &SiteDescriptor,
    max_links: usize,
) -> Vec<String> {
    let from_feeds = feed::links_from_feeds(fetcher, &site.feeds, &site.base_url, max_links).await;
    if !from_feeds.is_empty() {
        info!(count = from_feeds.len(), strategy = "feed", "Discovered links");
        return from_feeds;
    }

    let from_listing = listing::links_from_listing(fetcher, site, max_links).await;
    info!(count = from_listing.len(), strategy = "listing", "Discovered links");
    from_listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeFetcher;

    fn site() -> SiteDescriptor {
        SiteDescriptor::new(
            "mock",
            "https://mock.example/",
            "https://mock.example",
            "a.story",
            &["https://mock.example/rss"],
        )
    }

    #[tokio::test]
    async fn test_feed_wins_when_non_empty() {
        let fetcher = FakeFetcher::new()
            .xml(
                "https://mock.example/rss",
                "<rss><channel><item><link>/from-feed</link></item></channel></rss>",
            )
            .html("https://mock.example/", r#"<a class="story" href="/from-listing">x</a>"#);

        let links = discover_links(&fetcher, &site(), 100).await;
        assert_eq!(links, vec!["https://mock.example/from-feed"]);
        assert!(!fetcher.called().contains(&"https://mock.example/".to_string()));
    }

    #[tokio::test]
    async fn test_listing_fallback_when_feed_is_empty() {
        let fetcher = FakeFetcher::new()
            .xml("https://mock.example/rss", "<rss><channel></channel></rss>")
            .html("https://mock.example/", r#"<a class="story" href="/from-listing">x</a>"#);

        let links = discover_links(&fetcher, &site(), 100).await;
        assert_eq!(links, vec!["https://mock.example/from-listing"]);
    }

    #[tokio::test]
    async fn test_nothing_found_is_empty() {
        let links = discover_links(&FakeFetcher::new(), &site(), 100).await;
        assert!(links.is_empty());
    }
}
