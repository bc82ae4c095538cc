//! Data models shared across the crawl pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SiteDescriptor`]: Static description of one news outlet (listing page, feeds, selector)
//! - [`ArticlePayload`]: What the fetch chain produces for a single candidate URL
//! - [`ArticleRecord`]: A payload that has been given an identifier and a source name
//! - [`StoredRow`]: One row of the persisted CSV dataset, as written or read back
//!
//! Records are created once and never mutated; the persisted form is a plain
//! row with loosely typed fields so that hand-edited or legacy files still load.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Column order of the persisted dataset.
pub const COLUMNS: [&str; 9] = [
    "id",
    "source",
    "url",
    "title",
    "fetched_at",
    "t_total_sec",
    "content",
    "h1",
    "h2",
];

/// A news outlet the crawler knows how to discover links for.
///
/// Descriptors are built once at startup (either from the built-in registry
/// or from a YAML site file) and are only ever read afterwards.
///
/// # YAML form
///
/// ```yaml
/// - name: bbc
///   listing_url: https://www.bbc.com/news
///   base_url: https://www.bbc.com
///   link_selector: "a.gs-c-promo-heading[href*='/news/']"
///   feed: https://feeds.bbci.co.uk/news/world/rss.xml
/// ```
///
/// `feed` may be a single URL, a list of URLs, an empty string, or omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteDescriptor {
    /// Short outlet name, recorded as the `source` column.
    pub name: String,
    /// Section or homepage that links to individual articles.
    pub listing_url: String,
    /// Base used to resolve relative links.
    pub base_url: String,
    /// CSS selector picking article anchors on the listing page.
    pub link_selector: String,
    /// Feed URLs tried in order before falling back to the listing page.
    #[serde(rename = "feed", default, deserialize_with = "one_or_many")]
    pub feeds: Vec<String>,
}

impl SiteDescriptor {
    pub fn new(
        name: &str,
        listing_url: &str,
        base_url: &str,
        link_selector: &str,
        feeds: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            listing_url: listing_url.to_string(),
            base_url: base_url.to_string(),
            link_selector: link_selector.to_string(),
            feeds: feeds
                .iter()
                .filter(|f| !f.trim().is_empty())
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let feeds = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    };
    Ok(feeds
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect())
}

/// A successfully classified and extracted article page.
///
/// Produced by the fetch chain; carries no identifier yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePayload {
    /// Canonical URL (the AMP variant when that is what succeeded).
    pub url: String,
    pub title: String,
    /// Surviving paragraphs joined by blank lines.
    pub content: String,
    pub fetched_at: DateTime<Utc>,
    /// Wall-clock seconds from the start of the attempt chain, 3-decimal precision.
    pub t_total_sec: f64,
    pub h1: String,
    pub h2: String,
}

/// An article with its run-assigned identifier and source outlet.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: u64,
    pub source: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
    pub t_total_sec: f64,
    pub h1: String,
    pub h2: String,
}

impl ArticleRecord {
    pub fn new(id: u64, source: &str, payload: ArticlePayload) -> Self {
        Self {
            id,
            source: source.to_string(),
            url: payload.url,
            title: payload.title,
            content: payload.content,
            fetched_at: payload.fetched_at,
            t_total_sec: payload.t_total_sec,
            h1: payload.h1,
            h2: payload.h2,
        }
    }
}

/// One row of the dataset at rest.
///
/// Field order matches [`COLUMNS`]. Rows read back from disk may lack an
/// identifier; they are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRow {
    pub id: Option<u64>,
    pub source: String,
    pub url: String,
    pub title: String,
    pub fetched_at: String,
    pub t_total_sec: f64,
    pub content: String,
    pub h1: String,
    pub h2: String,
}

impl From<ArticleRecord> for StoredRow {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: Some(record.id),
            source: record.source,
            url: record.url,
            title: record.title,
            fetched_at: record.fetched_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            t_total_sec: record.t_total_sec,
            content: record.content,
            h1: record.h1,
            h2: record.h2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload() -> ArticlePayload {
        ArticlePayload {
            url: "https://example.com/a".to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            fetched_at: Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap(),
            t_total_sec: 1.234,
            h1: "Title".to_string(),
            h2: String::new(),
        }
    }

    #[test]
    fn test_site_descriptor_drops_empty_feeds() {
        let site = SiteDescriptor::new(
            "forbes",
            "https://www.forbes.com",
            "https://www.forbes.com",
            "a",
            &[""],
        );
        assert!(site.feeds.is_empty());
    }

    #[test]
    fn test_site_descriptor_yaml_single_feed() {
        let yaml = r#"
name: bbc
listing_url: https://www.bbc.com/news
base_url: https://www.bbc.com
link_selector: "a[href*='/news/']"
feed: https://feeds.bbci.co.uk/news/world/rss.xml
"#;
        let site: SiteDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(site.feeds, vec!["https://feeds.bbci.co.uk/news/world/rss.xml"]);
    }

    #[test]
    fn test_site_descriptor_yaml_feed_list_and_missing() {
        let yaml = r#"
- name: a
  listing_url: https://a.example
  base_url: https://a.example
  link_selector: a
  feed: [https://a.example/rss, "", https://a.example/atom]
- name: b
  listing_url: https://b.example
  base_url: https://b.example
  link_selector: a
"#;
        let sites: Vec<SiteDescriptor> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(sites[0].feeds, vec!["https://a.example/rss", "https://a.example/atom"]);
        assert!(sites[1].feeds.is_empty());
    }

    #[test]
    fn test_record_to_row_formats_timestamp_with_z() {
        let row = StoredRow::from(ArticleRecord::new(7, "cnn", payload()));
        assert_eq!(row.id, Some(7));
        assert_eq!(row.source, "cnn");
        assert_eq!(row.fetched_at, "2025-05-06T14:30:00.000000Z");
        assert!((row.t_total_sec - 1.234).abs() < f64::EPSILON);
    }
}
