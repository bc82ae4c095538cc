//! URL validation, normalization, and skip-list filtering.
//!
//! Every candidate link that leaves discovery has passed through
//! [`normalize_url`] and been checked against [`should_skip_url`].

use crate::outlets;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Query keys that only carry campaign/referral tracking.
static TRACKING_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(utm_.*|fbclid|gclid|gclsrc|mc_cid|mc_eid|_hsenc|_hsmi|ref|ref_src|spm)$")
        .unwrap()
});

/// Social, messaging, and consent hosts that never serve articles.
const BLOCKED_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "t.me",
    "wa.me",
    "whatsapp.com",
    "consent.youtube.com",
];

/// Auth and legal pages.
const BLOCKED_PATH_PARTS: &[&str] = &[
    "/signin",
    "/login",
    "/subscribe",
    "/registration",
    "/privacy",
    "/terms",
];

/// True iff `u` parses with an http(s) scheme and a host.
pub fn is_valid_url(u: &str) -> bool {
    match Url::parse(u) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Remove tracking query keys, keeping the first non-empty value of every
/// other key in order of first appearance. The fragment is dropped.
///
/// Returns the input unchanged if it does not parse.
pub fn strip_tracking_params(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, v)| !v.is_empty() && !TRACKING_PARAM.is_match(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .unique_by(|(k, _)| k.clone())
        .collect();

    parsed.set_fragment(None);
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}

/// Resolve `href` against `base`, strip tracking keys, and return the result
/// only if it is still a valid http(s) URL.
pub fn normalize_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = match Url::parse(base) {
        Ok(base) => base.join(href).ok()?,
        Err(_) => Url::parse(href).ok()?,
    };

    let absolute = absolute.to_string();
    if is_valid_url(&absolute) {
        Some(strip_tracking_params(&absolute))
    } else {
        None
    }
}

/// True if the URL points somewhere that is never worth fetching: a blocked
/// social/consent host, an auth or legal page, or a known non-article path
/// on a specific outlet.
pub fn should_skip_url(u: &str) -> bool {
    let (host, path) = match Url::parse(u) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
            parsed.path().to_string(),
        ),
        Err(_) => (String::new(), u.to_string()),
    };

    if BLOCKED_DOMAINS.iter().any(|d| host_matches(&host, d)) {
        return true;
    }
    if BLOCKED_PATH_PARTS.iter().any(|p| path.contains(p)) {
        return true;
    }
    outlets::is_non_article_path(u)
}

/// True if `host` is `domain` or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True if `u` parses and its host belongs to `domain`.
pub fn on_domain(u: &str, domain: &str) -> bool {
    Url::parse(u)
        .ok()
        .and_then(|p| p.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|h| host_matches(&h, domain))
}
