//! The catalog of outlets to crawl.
//!
//! The built-in registry covers English, Arabic, and Russian sources. A YAML
//! site file can replace it at startup; either way the registry is loaded
//! once and handed to the pipeline by reference.
//!
//! # Sources
//!
//! | Language | Outlets |
//! |----------|---------|
//! | English | cnn, bbc, nytimes, guardian, reuters, washingtonpost, forbes, techcrunch, ... |
//! | Arabic | aljazeera_ar, skynewsarabia, alarabiya, akhbaar24, ... |
//! | Russian | rt, tass, rbc, meduza, echo |

use crate::error::RegistryError;
use crate::models::SiteDescriptor;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Ordered, immutable set of site descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    sites: Vec<SiteDescriptor>,
}

impl Registry {
    pub fn new(sites: Vec<SiteDescriptor>) -> Self {
        Self { sites }
    }

    /// The compiled-in outlet catalog.
    pub fn builtin() -> Self {
        Self::new(builtin_sites())
    }

    /// Load a registry from a YAML list of site descriptors.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let registry = Self::from_yaml_str(&raw)?;
        info!(count = registry.len(), "Loaded site file");
        Ok(registry)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, RegistryError> {
        let sites: Vec<SiteDescriptor> = serde_yaml::from_str(raw)?;
        if sites.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self::new(sites))
    }

    /// Keep only the named sites, preserving registry order. An empty filter keeps everything.
    pub fn only(self, names: &[String]) -> Self {
        if names.is_empty() {
            return self;
        }
        for name in names {
            if !self.sites.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
                warn!(site = %name, "Requested site is not in the registry");
            }
        }
        let sites = self
            .sites
            .into_iter()
            .filter(|s| names.iter().any(|n| n.eq_ignore_ascii_case(&s.name)))
            .collect();
        Self::new(sites)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteDescriptor> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

fn builtin_sites() -> Vec<SiteDescriptor> {
    let s = SiteDescriptor::new;
    vec![
        // English
        s(
            "cnn",
            "https://edition.cnn.com/world",
            "https://edition.cnn.com",
            "a.container_link.containerlink--type-article, a.container_lead-plus-headlines_link, a[href*='/202']",
            &["https://rss.cnn.com/rss/edition_world.rss"],
        ),
        s(
            "bbc",
            "https://www.bbc.com/news",
            "https://www.bbc.com",
            "a.gs-c-promo-heading[href*='/news/']",
            &["https://feeds.bbci.co.uk/news/world/rss.xml"],
        ),
        s(
            "nytimes",
            "https://www.nytimes.com/section/world",
            "https://www.nytimes.com",
            "a[href*='/20'][href$='.html']",
            &["https://rss.nytimes.com/services/xml/rss/nyt/World.xml"],
        ),
        s(
            "guardian",
            "https://www.theguardian.com/world",
            "https://www.theguardian.com",
            "a[href*='/world/']",
            &["https://www.theguardian.com/world/rss"],
        ),
        s(
            "reuters",
            "https://www.reuters.com/world",
            "https://www.reuters.com",
            "a[href*='/world/']",
            &["https://feeds.reuters.com/reuters/worldNews"],
        ),
        s(
            "washingtonpost",
            "https://www.washingtonpost.com/world",
            "https://www.washingtonpost.com",
            "a[href*='/world/']",
            &["https://feeds.washingtonpost.com/rss/world"],
        ),
        s("forbes", "https://www.forbes.com", "https://www.forbes.com", "a[href*='/']", &[]),
        s(
            "techcrunch",
            "https://techcrunch.com",
            "https://techcrunch.com",
            "a.post-block__title__link",
            &["https://techcrunch.com/feed/"],
        ),
        s(
            "thenextweb",
            "https://thenextweb.com",
            "https://thenextweb.com",
            "a[href*='/news/']",
            &[],
        ),
        s(
            "medium",
            "https://medium.com/topic/world",
            "https://medium.com",
            "a[href*='medium.com']",
            &["https://medium.com/feed/tag/world"],
        ),
        s(
            "devto",
            "https://dev.to",
            "https://dev.to",
            "a.crayons-story__hidden-navigation-link",
            &["https://dev.to/feed"],
        ),
        s(
            "mashable",
            "https://mashable.com",
            "https://mashable.com",
            "a[href*='/article/']",
            &["https://mashable.com/feeds/rss"],
        ),
        s(
            "wsj",
            "https://www.wsj.com/news/world",
            "https://www.wsj.com",
            "a[href*='/articles/']",
            &[],
        ),
        s(
            "wired",
            "https://www.wired.com",
            "https://www.wired.com",
            "a[href*='/story/']",
            &["https://www.wired.com/feed/rss"],
        ),
        s(
            "npr",
            "https://www.npr.org/sections/world/",
            "https://www.npr.org",
            "a[href*='/202']",
            &["https://feeds.npr.org/1004/rss.xml"],
        ),
        s(
            "vox",
            "https://www.vox.com/world",
            "https://www.vox.com",
            "a[href*='/20']",
            &["https://www.vox.com/rss/world/index.xml"],
        ),
        s(
            "bloomberg",
            "https://www.bloomberg.com/world",
            "https://www.bloomberg.com",
            "a[href*='/news/articles/']",
            &[],
        ),
        s(
            "seekingalpha",
            "https://seekingalpha.com/market-news",
            "https://seekingalpha.com",
            "a[href*='/news/']",
            &["https://seekingalpha.com/market_currents.xml"],
        ),
        s(
            "engadget",
            "https://www.engadget.com",
            "https://www.engadget.com",
            "a[href*='/202']",
            &["https://www.engadget.com/rss.xml"],
        ),
        s(
            "verge",
            "https://www.theverge.com",
            "https://www.theverge.com",
            "a[href*='/20']",
            &["https://www.theverge.com/rss/index.xml"],
        ),
        s("ft", "https://www.ft.com/world", "https://www.ft.com", "a[href*='/content/']", &[]),
        s(
            "arstechnica",
            "https://arstechnica.com",
            "https://arstechnica.com",
            "a[href*='/20']",
            &["https://arstechnica.com/feed/"],
        ),
        s(
            "cnet",
            "https://www.cnet.com/news/",
            "https://www.cnet.com",
            "a[href*='/news/']",
            &["https://www.cnet.com/rss/news/"],
        ),
        s(
            "slashdot",
            "https://slashdot.org",
            "https://slashdot.org",
            "a.story",
            &["http://rss.slashdot.org/Slashdot/slashdotMain"],
        ),
        s(
            "huffpost",
            "https://www.huffpost.com/news/world-news",
            "https://www.huffpost.com",
            "a[href*='/entry/']",
            &["https://www.huffpost.com/section/world-news/feed"],
        ),
        // Arabic
        s(
            "aljazeera_ar",
            "https://www.aljazeera.net",
            "https://www.aljazeera.net",
            "a[href*='/news/']",
            &["https://www.aljazeera.net/aljazeera-arabic-feed"],
        ),
        s(
            "skynewsarabia",
            "https://www.skynewsarabia.com",
            "https://www.skynewsarabia.com",
            "a[href*='/news/']",
            &["https://www.skynewsarabia.com/web/rss/rss"],
        ),
        s(
            "alarabiya",
            "https://www.alarabiya.net",
            "https://www.alarabiya.net",
            "a[href*='/news/']",
            &["https://www.alarabiya.net/.mrss/ar.xml"],
        ),
        s(
            "akhbaar24",
            "https://www.akhbaar24.com",
            "https://www.akhbaar24.com",
            "a[href*='/article/']",
            &[],
        ),
        s(
            "middleeastonline",
            "https://middle-east-online.com",
            "https://middle-east-online.com",
            "a[href*='/']",
            &[],
        ),
        s(
            "thenational",
            "https://www.thenationalnews.com",
            "https://www.thenationalnews.com",
            "a[href*='/']",
            &["https://www.thenationalnews.com/arc/outboundfeeds/rss/"],
        ),
        s(
            "arabiccnn",
            "https://arabic.cnn.com",
            "https://arabic.cnn.com",
            "a[href*='/']",
            &["https://arabic.cnn.com/rss"],
        ),
        s(
            "bbcarabic",
            "https://www.bbc.com/arabic",
            "https://www.bbc.com/arabic",
            "a[href*='/']",
            &["https://feeds.bbci.co.uk/arabic/rss.xml"],
        ),
        s("masaar", "https://www.masaar.com", "https://www.masaar.com", "a[href*='/']", &[]),
        s("9elp", "https://9elp.com", "https://9elp.com", "a[href*='/']", &[]),
        // Russian
        s("rt", "https://www.rt.com", "https://www.rt.com", "a[href*='/']", &["https://www.rt.com/rss/news/"]),
        s("tass", "https://tass.com", "https://tass.com", "a[href*='/']", &["https://tass.com/rss/v2.xml"]),
        s(
            "rbc",
            "https://www.rbc.ru",
            "https://www.rbc.ru",
            "a[href*='/']",
            &["https://rssexport.rbc.ru/rbcnews/news/20/full.rss"],
        ),
        s(
            "meduza",
            "https://meduza.io/en",
            "https://meduza.io/en",
            "a[href*='/']",
            &["https://meduza.io/en/rss/all"],
        ),
        s("echo", "https://echo.msk.ru", "https://echo.msk.ru", "a[href*='/']", &[]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::is_valid_url;
    use scraper::Selector;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_registry_shape() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 40);

        let names: HashSet<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), registry.len(), "site names must be unique");
    }

    #[test]
    fn test_builtin_registry_urls_and_selectors_are_usable() {
        for site in Registry::builtin().iter() {
            assert!(is_valid_url(&site.listing_url), "{}", site.name);
            assert!(is_valid_url(&site.base_url), "{}", site.name);
            assert!(site.feeds.iter().all(|f| is_valid_url(f)), "{}", site.name);
            assert!(Selector::parse(&site.link_selector).is_ok(), "{}", site.name);
        }
    }

    #[test]
    fn test_only_filters_and_keeps_order() {
        let names = vec!["TASS".to_string(), "bbc".to_string()];
        let registry = Registry::builtin().only(&names);
        let kept: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(kept, vec!["bbc", "tass"]);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
- name: local
  listing_url: http://127.0.0.1:8080/
  base_url: http://127.0.0.1:8080
  link_selector: "a.story"
  feed: ""
"#;
        let registry = Registry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.iter().next().unwrap().feeds.is_empty());
    }

    #[test]
    fn test_from_yaml_str_rejects_empty_and_garbage() {
        assert!(matches!(Registry::from_yaml_str("[]"), Err(RegistryError::Empty)));
        assert!(Registry::from_yaml_str("name: [unclosed").is_err());
    }
}
