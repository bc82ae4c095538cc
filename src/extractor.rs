//! Title, body, and heading extraction from a parsed article page.
//!
//! Body text is built from paragraphs only. Paragraphs of 60 characters or
//! fewer, or containing boilerplate markers (copyright, advertisement,
//! subscribe, sign up, newsletter), are dropped; the rest are joined with a
//! blank line between them.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Container that holds the real body on outlets that mark it up (NYT and clones).
pub const ARTICLE_BODY: &str = r#"section[name="articleBody"]"#;

/// Paragraphs must be strictly longer than this to count as body text.
pub const LONG_PARAGRAPH_CHARS: usize = 60;

const NOISE_MARKERS: &[&str] = &[
    "copyright",
    "advertisement",
    "subscribe",
    "sign up",
    "newsletter",
];

static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse(ARTICLE_BODY).unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());

/// Everything pulled from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub title: String,
    pub content: String,
    pub h1: String,
    pub h2: String,
}

/// Title and body are both required; headings are side data.
pub fn extract(doc: &Html) -> Option<Extracted> {
    let title = extract_title(doc)?;
    let content = extract_content(doc)?;
    let h1 = Some(headings(doc, &H1)).filter(|h| !h.is_empty()).unwrap_or_else(|| title.clone());
    Some(Extracted {
        title,
        content,
        h1,
        h2: headings(doc, &H2),
    })
}

/// `og:title`, else the first `<h1>`.
pub fn extract_title(doc: &Html) -> Option<String> {
    let og = doc
        .select(&OG_TITLE)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(title) = og {
        return Some(title.to_string());
    }

    doc.select(&H1)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Body paragraphs, preferring the marked-up body container, then `<article>`,
/// then the whole document.
pub fn extract_content(doc: &Html) -> Option<String> {
    if let Some(body) = doc.select(&BODY).next() {
        if let Some(content) = join_paragraphs(body.select(&P)) {
            return Some(content);
        }
    }

    match doc.select(&ARTICLE).next() {
        Some(article) => join_paragraphs(article.select(&P)),
        None => join_paragraphs(doc.select(&P)),
    }
}

/// All text of the given heading level, space-joined.
pub fn headings(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_noise(text: &str) -> bool {
    let low = text.to_lowercase();
    NOISE_MARKERS.iter().any(|marker| low.contains(marker))
}

fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    let kept: Vec<String> = paragraphs
        .map(element_text)
        .filter(|t| t.chars().count() > LONG_PARAGRAPH_CHARS && !is_noise(t))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join("\n\n"))
    }
}

/// Descendant text nodes, trimmed, empty ones dropped, joined by a space.
pub fn element_text(el: ElementRef<'_>) -> String {
    joined_text(el, " ")
}

/// Same as [`element_text`] but without a separator; used for length tests.
pub fn compact_text(el: ElementRef<'_>) -> String {
    joined_text(el, "")
}

fn joined_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "The first long paragraph describes the event in more than sixty characters.";
    const LONG_B: &str = "A second long paragraph adds context and quotes from officials at the scene.";
    const LONG_C: &str = "The third long paragraph closes the story with what is expected to happen next.";

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_title_prefers_og_title() {
        let d = doc(r#"<meta property="og:title" content="  From OG  "><h1>From H1</h1>"#);
        assert_eq!(extract_title(&d).as_deref(), Some("From OG"));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let d = doc(r#"<meta property="og:title" content="   "><h1> Breaking <span>News</span> </h1><h1>Second</h1>"#);
        assert_eq!(extract_title(&d).as_deref(), Some("Breaking News"));
        assert_eq!(extract_title(&doc("<p>no headings</p>")), None);
    }

    #[test]
    fn test_content_drops_short_and_noisy_paragraphs() {
        let html = format!(
            "<p>{LONG_A}</p>
             <p>Too short to matter.</p>
             <p>Advertisement: this block is long enough but is sponsored filler text here.</p>
             <p>{LONG_B}</p>
             <p>Sign up for our newsletter to get the latest stories delivered to your inbox.</p>
             <p>Copyright 2025 Example Media Group. All rights reserved worldwide, forever.</p>
             <p>{LONG_C}</p>"
        );
        let content = extract_content(&doc(&html)).unwrap();
        assert_eq!(content, format!("{LONG_A}\n\n{LONG_B}\n\n{LONG_C}"));
    }

    #[test]
    fn test_content_boundary_is_strictly_greater_than_sixty() {
        let exactly_sixty = "x".repeat(60);
        let sixty_one = "y".repeat(61);
        let html = format!("<p>{exactly_sixty}</p><p>{sixty_one}</p>");
        assert_eq!(extract_content(&doc(&html)).as_deref(), Some(sixty_one.as_str()));
    }

    #[test]
    fn test_content_counts_characters_not_bytes() {
        let arabic = "ن".repeat(40);
        assert_eq!(extract_content(&doc(&format!("<p>{arabic}</p>"))), None);
    }

    #[test]
    fn test_content_prefers_article_body_container() {
        let html = format!(
            r#"<article><p>{LONG_A}</p></article><section name="articleBody"><p>{LONG_B}</p></section>"#
        );
        assert_eq!(extract_content(&doc(&html)).as_deref(), Some(LONG_B));
    }

    #[test]
    fn test_content_falls_through_empty_body_container() {
        let html = format!(
            r#"<section name="articleBody"><p>short</p></section><article><p>{LONG_A}</p></article><p>{LONG_C}</p>"#
        );
        assert_eq!(extract_content(&doc(&html)).as_deref(), Some(LONG_A));
    }

    #[test]
    fn test_content_empty_is_none() {
        assert_eq!(extract_content(&doc("<article><p>tiny</p></article>")), None);
    }

    #[test]
    fn test_headings_are_collected_independently() {
        let d = doc("<h1>One</h1><h2>Two</h2><h2> Three <b>bold</b></h2><p>tiny</p>");
        assert_eq!(headings(&d, &H1), "One");
        assert_eq!(headings(&d, &H2), "Two Three bold");
    }

    #[test]
    fn test_extract_requires_title_and_content() {
        let html = format!(r#"<meta property="og:title" content="Headline"><p>{LONG_A}</p>"#);
        let extracted = extract(&doc(&html)).unwrap();
        assert_eq!(extracted.title, "Headline");
        assert_eq!(extracted.h1, "Headline");
        assert_eq!(extracted.h2, "");

        assert_eq!(extract(&doc("<h1>Title only</h1><p>tiny</p>")), None);
    }

    #[test]
    fn test_is_noise_is_case_insensitive() {
        assert!(is_noise("SUBSCRIBE now"));
        assert!(!is_noise("A plain sentence."));
    }
}
