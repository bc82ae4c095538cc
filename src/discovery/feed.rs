//! RSS and Atom feed link extraction.
//!
//! # Accepted shapes
//!
//! - RSS 2.0 / RSS 1.0: `<item><link>URL</link></item>`, falling back to
//!   `<guid>` when it looks like an absolute URL
//! - Atom: `<entry><link href="URL"/></entry>` with no `rel` or `rel="alternate"`
//!
//! Elements are matched by local name, so namespace prefixes do not matter.

use crate::transport::{Fetcher, HeaderProfile};
use crate::urls::{normalize_url, should_skip_url};
use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument, warn};

/// Fetch every feed in order and return their article links, normalized,
/// filtered, de-duplicated, and capped at `max_links`.
///
/// A feed that cannot be fetched or parsed is skipped; if all fail the result is empty.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub async fn links_from_feeds<F: Fetcher>(
    fetcher: &F,
    feeds: &[String],
    base_url: &str,
    max_links: usize,
) -> Vec<String> {
    let mut candidates = Vec::new();

    for feed in feeds {
        let page = match fetcher.get(feed, HeaderProfile::Domain).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                warn!(%feed, status = page.status, "Feed request returned an error status");
                continue;
            }
            Err(e) => {
                warn!(%feed, error = %e, "Feed request failed");
                continue;
            }
        };

        match parse_feed_links(&page.body) {
            Ok(raw) => {
                debug!(%feed, count = raw.len(), "Parsed feed");
                candidates.extend(
                    raw.iter()
                        .filter_map(|link| normalize_url(base_url, link))
                        .filter(|u| !should_skip_url(u)),
                );
            }
            Err(e) => warn!(%feed, error = %e, "Feed is not well-formed XML; skipping"),
        }
    }

    candidates.into_iter().unique().take(max_links).collect()
}

#[derive(Default)]
struct ItemState {
    link: String,
    guid: String,
    href: Option<String>,
}

enum Capture {
    Link,
    Guid,
}

/// Raw link strings from an RSS or Atom document, in document order.
pub fn parse_feed_links(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut links = Vec::new();
    let mut item: Option<ItemState> = None;
    let mut in_entry = false;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => item = Some(ItemState::default()),
                b"entry" => in_entry = true,
                b"link" => {
                    if let Some(state) = item.as_mut() {
                        capture = Some(Capture::Link);
                        if state.href.is_none() {
                            state.href = attr(&e, b"href");
                        }
                    } else if in_entry {
                        links.extend(atom_href(&e));
                    }
                }
                b"guid" if item.is_some() => capture = Some(Capture::Guid),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"link" => {
                if let Some(state) = item.as_mut() {
                    if state.href.is_none() {
                        state.href = attr(&e, b"href");
                    }
                } else if in_entry {
                    links.extend(atom_href(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"item" => {
                    if let Some(link) = item.take().and_then(item_link) {
                        links.push(link);
                    }
                    capture = None;
                }
                b"entry" => in_entry = false,
                b"link" | b"guid" => capture = None,
                _ => {}
            },
            Event::Text(t) => push_text(&mut item, &capture, &String::from_utf8_lossy(&t)),
            Event::CData(t) => push_text(&mut item, &capture, &String::from_utf8_lossy(&t)),
            Event::GeneralRef(r) => {
                let entity = format!("&{};", String::from_utf8_lossy(&r));
                let resolved = unescape(&entity).map(|c| c.into_owned()).unwrap_or(entity);
                push_text(&mut item, &capture, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(links)
}

fn push_text(item: &mut Option<ItemState>, capture: &Option<Capture>, text: &str) {
    let (Some(state), Some(capture)) = (item.as_mut(), capture) else {
        return;
    };
    match capture {
        Capture::Link => state.link.push_str(text),
        Capture::Guid => state.guid.push_str(text),
    }
}

/// `<link>` text, else a URL-shaped `<guid>`, else a `<link href>` attribute.
fn item_link(state: ItemState) -> Option<String> {
    let link = state.link.trim();
    if !link.is_empty() {
        return Some(link.to_string());
    }
    let guid = state.guid.trim();
    if guid.starts_with("http") {
        return Some(guid.to_string());
    }
    state.href
}

fn atom_href(e: &BytesStart<'_>) -> Option<String> {
    let rel = attr(e, b"rel");
    match rel.as_deref() {
        None | Some("alternate") => attr(e, b"href"),
        Some(_) => None,
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    let a = e.try_get_attribute(name).ok().flatten()?;
    let raw = String::from_utf8_lossy(&a.value).into_owned();
    let value = unescape(&raw).map(|c| c.into_owned()).unwrap_or(raw);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
