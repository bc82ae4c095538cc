//! Heuristic "is this page an article?" decision.
//!
//! Signals are independent predicates evaluated in a fixed precedence order;
//! the first one that fires decides. There is no score.
//!
//! | Order | Signal | Fires when |
//! |-------|--------|------------|
//! | 1 | `og-type` | `<meta property="og:type" content="article">` (any case) |
//! | 2 | `json-ld` | a JSON-LD block (or its `@graph`) has `@type` Article/NewsArticle |
//! | 3 | `structure` | `<article>` + `<h1>` + at least 3 paragraphs over 60 chars |
//! | 4 | `outlet-override` | outlet-specific partial signals (bbc.com, nytimes.com) |

use crate::extractor::{ARTICLE_BODY, LONG_PARAGRAPH_CHARS, compact_text};
use crate::outlets::{BBC, NYTIMES};
use crate::urls::on_domain;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::trace;

static OG_TYPE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:type"]"#).unwrap());
static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BODY_P: Lazy<Selector> =
    Lazy::new(|| Selector::parse(&format!("{ARTICLE_BODY} p")).unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse(ARTICLE_BODY).unwrap());

const MIN_LONG_PARAGRAPHS: usize = 3;

type Signal = fn(&Html, Option<&str>) -> bool;

/// Signals in precedence order.
const SIGNALS: &[(&str, Signal)] = &[
    ("og-type", og_type_is_article),
    ("json-ld", structured_data_is_article),
    ("structure", structure_is_article),
    ("outlet-override", outlet_override),
];

/// Name of the first signal that classifies the page as an article, if any.
pub fn classify(doc: &Html, url: Option<&str>) -> Option<&'static str> {
    SIGNALS
        .iter()
        .find(|(_, signal)| signal(doc, url))
        .map(|(name, _)| *name)
}

pub fn is_article_page(doc: &Html, url: Option<&str>) -> bool {
    let signal = classify(doc, url);
    trace!(?signal, url = url.unwrap_or_default(), "Classified page");
    signal.is_some()
}

/// `og:type` meta says "article".
pub fn og_type_is_article(doc: &Html, _url: Option<&str>) -> bool {
    doc.select(&OG_TYPE)
        .next()
        .and_then(|m| m.value().attr("content"))
        .is_some_and(|c| c.trim().eq_ignore_ascii_case("article"))
}

/// Any JSON-LD block types itself (directly or within `@graph`) as an article.
/// Blocks that fail to parse are ignored.
pub fn structured_data_is_article(doc: &Html, _url: Option<&str>) -> bool {
    doc.select(&LD_JSON).any(|script| {
        let raw: String = script.text().collect();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(data) => json_ld_is_article(&data),
            Err(e) => {
                trace!(error = %e, "Skipping malformed JSON-LD block");
                false
            }
        }
    })
}

fn json_ld_is_article(data: &Value) -> bool {
    let items: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    items.into_iter().filter_map(Value::as_object).any(|obj| {
        let in_graph = obj
            .get("@graph")
            .and_then(Value::as_array)
            .is_some_and(|graph| graph.iter().any(|g| g.get("@type").is_some_and(type_is_article)));
        in_graph || obj.get("@type").is_some_and(type_is_article)
    })
}

fn type_is_article(t: &Value) -> bool {
    let is_article =
        |s: &str| s.eq_ignore_ascii_case("article") || s.eq_ignore_ascii_case("newsarticle");
    match t {
        Value::String(s) => is_article(s),
        Value::Array(types) => types.iter().filter_map(Value::as_str).any(is_article),
        _ => false,
    }
}

/// `<article>` + `<h1>` + enough long paragraphs anywhere in the document.
pub fn structure_is_article(doc: &Html, _url: Option<&str>) -> bool {
    has(doc, &ARTICLE) && has(doc, &H1) && count_long(doc.select(&P)) >= MIN_LONG_PARAGRAPHS
}

/// Weaker acceptance rules for outlets whose markup defeats the generic checks.
pub fn outlet_override(doc: &Html, url: Option<&str>) -> bool {
    let Some(url) = url else {
        return false;
    };

    if on_domain(url, BBC) && url.contains("/news/") {
        return has(doc, &H1) || count_long(doc.select(&P)) >= MIN_LONG_PARAGRAPHS;
    }

    if on_domain(url, NYTIMES) && has(doc, &BODY) {
        return count_long(doc.select(&BODY_P)) >= MIN_LONG_PARAGRAPHS;
    }

    false
}

fn has(doc: &Html, selector: &Selector) -> bool {
    doc.select(selector).next().is_some()
}

fn count_long<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> usize {
    paragraphs
        .filter(|p| compact_text(*p).chars().count() > LONG_PARAGRAPH_CHARS)
        .count()
}
