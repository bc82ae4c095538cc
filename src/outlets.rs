//! Per-outlet quirks keyed by domain.
//!
//! A handful of outlets need special treatment regardless of which registry
//! entry produced the link:
//!
//! | Outlet | Quirk |
//! |--------|-------|
//! | nytimes.com | live/interactive/video paths are never articles; AMP variant at `*.amp.html`; mobile UA + referer |
//! | washingtonpost.com | AMP variant via `outputType=amp`; mobile UA + referer |
//! | bbc.com | `/news/` pages are accepted on weaker structural signals |

use crate::urls::on_domain;
use url::Url;

pub const NYTIMES: &str = "nytimes.com";
pub const WASHINGTON_POST: &str = "washingtonpost.com";
pub const BBC: &str = "bbc.com";

const NYT_NON_ARTICLE_SEGMENTS: &[&str] = &["/live/", "/interactive/", "/video/"];

/// Outlets that reject the desktop UA but serve mobile visitors arriving from Google News.
const MOBILE_PROFILE_DOMAINS: &[&str] = &[NYTIMES, WASHINGTON_POST];

/// Known non-article sections (live blogs, interactives, video pages).
pub fn is_non_article_path(u: &str) -> bool {
    on_domain(u, NYTIMES) && NYT_NON_ARTICLE_SEGMENTS.iter().any(|seg| u.contains(seg))
}

/// True if requests to this URL should carry the mobile header profile.
pub fn wants_mobile_profile(u: &str) -> bool {
    MOBILE_PROFILE_DOMAINS.iter().any(|d| on_domain(u, d))
}

/// The AMP variant of an article URL, for outlets that publish one.
pub fn amp_variant(u: &str) -> Option<String> {
    if on_domain(u, NYTIMES) {
        let amp = match u.strip_suffix(".html") {
            Some(stem) => format!("{stem}.amp.html"),
            None => format!("{}.amp.html", u.trim_end_matches('/')),
        };
        return Some(amp);
    }

    if on_domain(u, WASHINGTON_POST) {
        let mut parsed = Url::parse(u).ok()?;
        parsed.query_pairs_mut().append_pair("outputType", "amp");
        return Some(parsed.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nyt_amp_variant() {
        assert_eq!(
            amp_variant("https://www.nytimes.com/2025/05/06/world/europe/story.html").as_deref(),
            Some("https://www.nytimes.com/2025/05/06/world/europe/story.amp.html")
        );
        assert_eq!(
            amp_variant("https://www.nytimes.com/2025/05/06/world/story/").as_deref(),
            Some("https://www.nytimes.com/2025/05/06/world/story.amp.html")
        );
    }

    #[test]
    fn test_wapo_amp_variant_appends_query() {
        assert_eq!(
            amp_variant("https://www.washingtonpost.com/world/2025/05/06/story/").as_deref(),
            Some("https://www.washingtonpost.com/world/2025/05/06/story/?outputType=amp")
        );
        assert_eq!(
            amp_variant("https://www.washingtonpost.com/world/story/?itid=1").as_deref(),
            Some("https://www.washingtonpost.com/world/story/?itid=1&outputType=amp")
        );
    }

    #[test]
    fn test_no_amp_for_other_outlets() {
        assert_eq!(amp_variant("https://www.bbc.com/news/world-1"), None);
    }

    #[test]
    fn test_non_article_paths_only_on_nyt() {
        assert!(is_non_article_path("https://www.nytimes.com/video/world/123"));
        assert!(!is_non_article_path("https://www.nytimes.com/2025/05/06/world/story.html"));
        assert!(!is_non_article_path("https://edition.cnn.com/live/news/x"));
    }

    #[test]
    fn test_mobile_profile_domains() {
        assert!(wants_mobile_profile("https://www.nytimes.com/section/world"));
        assert!(wants_mobile_profile("https://feeds.washingtonpost.com/rss/world"));
        assert!(!wants_mobile_profile("https://www.bbc.com/news"));
    }
}
