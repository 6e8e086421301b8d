//! Series metadata extraction.
//!
//! Each field is an ordered chain of extractor functions. The first one that
//! yields a non-blank value wins; when every link fails the field falls back
//! to a fixed default, so extraction never fails.

use crate::document::{Document, element_text};
use crate::model::{SeriesKind, SeriesStatus, UNKNOWN_TITLE};
use crate::normalize::{is_broken_description, resolve_url};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Raw metadata fields, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFields {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub genres: Vec<String>,
    pub status: SeriesStatus,
    pub kind: SeriesKind,
    pub author: Option<String>,
    pub artist: Option<String>,
}

type Extractor = fn(&Document) -> Option<String>;

/// CSS selectors used for metadata.
struct Selectors {
    theme_title: Selector,
    title_badges: Selector,
    heading: Selector,
    title_tag: Selector,
    description_bodies: Vec<Selector>,
    theme_cover: Selector,
    genres: Selector,
    status: Selector,
    info_rows: Selector,
    info_heading: Selector,
    info_content: Selector,
    author: Selector,
    artist: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            theme_title: Selector::parse(".post-title h1").unwrap(),
            title_badges: Selector::parse("span.manga-title-badges").unwrap(),
            heading: Selector::parse("h1").unwrap(),
            title_tag: Selector::parse("title").unwrap(),
            description_bodies: [
                ".series-synopsis",
                ".summary__content",
                ".description-summary",
                ".entry-content p",
                "#description-text",
            ]
            .iter()
            .map(|s| Selector::parse(s).unwrap())
            .collect(),
            theme_cover: Selector::parse(".summary_image img").unwrap(),
            genres: Selector::parse(
                ".genres-content a, .post-content_item.genres .summary-content a, .mgen a, .seriestugenre a",
            )
            .unwrap(),
            status: Selector::parse(".post-status .summary-content, .tsinfo .imptdt, .status")
                .unwrap(),
            info_rows: Selector::parse(".post-content_item").unwrap(),
            info_heading: Selector::parse(".summary-heading").unwrap(),
            info_content: Selector::parse(".summary-content").unwrap(),
            author: Selector::parse(".author-content a").unwrap(),
            artist: Selector::parse(".artist-content a").unwrap(),
        }
    }
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(Selectors::new);

const TITLE_CHAIN: &[Extractor] = &[
    title_from_theme,
    title_from_heading,
    title_from_open_graph,
    title_from_title_tag,
];

const DESCRIPTION_CHAIN: &[Extractor] = &[
    description_from_open_graph,
    description_from_body,
    description_from_meta,
];

const THUMBNAIL_CHAIN: &[Extractor] = &[
    thumbnail_from_theme,
    thumbnail_from_open_graph,
    thumbnail_from_twitter_card,
];

fn title_from_theme(doc: &Document) -> Option<String> {
    doc.select(&SELECTORS.theme_title).next().and_then(heading_text)
}

fn title_from_heading(doc: &Document) -> Option<String> {
    doc.select(&SELECTORS.heading).next().and_then(heading_text)
}

/// Heading text minus badge spans such as "HOT" or "NEW".
fn heading_text(heading: ElementRef) -> Option<String> {
    let mut title = element_text(heading);
    for badge in heading.select(&SELECTORS.title_badges) {
        let badge = element_text(badge);
        if !badge.is_empty() {
            title = title.replacen(&badge, "", 1);
        }
    }
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

fn title_from_open_graph(doc: &Document) -> Option<String> {
    doc.meta("og:title")
}

fn title_from_title_tag(doc: &Document) -> Option<String> {
    doc.first_text(&SELECTORS.title_tag)
}

fn description_from_open_graph(doc: &Document) -> Option<String> {
    doc.meta("og:description")
}

fn description_from_body(doc: &Document) -> Option<String> {
    SELECTORS
        .description_bodies
        .iter()
        .filter_map(|s| doc.first_text(s))
        .find(|t| !is_broken_description(t))
}

fn description_from_meta(doc: &Document) -> Option<String> {
    doc.meta("description")
}

fn thumbnail_from_theme(doc: &Document) -> Option<String> {
    doc.first_image(&SELECTORS.theme_cover)
}

fn thumbnail_from_open_graph(doc: &Document) -> Option<String> {
    doc.meta("og:image")
}

fn thumbnail_from_twitter_card(doc: &Document) -> Option<String> {
    doc.meta("twitter:image")
}

fn any_value(_: &str) -> bool {
    true
}

fn usable_description(text: &str) -> bool {
    !is_broken_description(text)
}

/// Runs `chain` and returns the first value that is non-blank and accepted.
fn first_usable(doc: &Document, chain: &[Extractor], accept: fn(&str) -> bool) -> Option<String> {
    chain
        .iter()
        .filter_map(|extract| extract(doc))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty() && accept(v))
}

/// Extracts every metadata field from a series page.
pub fn extract_metadata(doc: &Document, page_url: &Url) -> MetadataFields {
    let title = first_usable(doc, TITLE_CHAIN, any_value)
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let description =
        first_usable(doc, DESCRIPTION_CHAIN, usable_description).unwrap_or_default();

    let thumbnail_url = first_usable(doc, THUMBNAIL_CHAIN, any_value)
        .and_then(|raw| resolve_url(page_url, &raw))
        .unwrap_or_default();

    MetadataFields {
        title,
        description,
        thumbnail_url,
        genres: extract_genres(doc),
        status: extract_status(doc),
        kind: extract_kind(doc).unwrap_or_default(),
        author: joined_names(doc, &SELECTORS.author),
        artist: joined_names(doc, &SELECTORS.artist),
    }
}

fn extract_genres(doc: &Document) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.all_texts(&SELECTORS.genres)
        .into_iter()
        .filter(|g| seen.insert(g.clone()))
        .collect()
}

fn extract_status(doc: &Document) -> SeriesStatus {
    if doc
        .all_texts(&SELECTORS.status)
        .iter()
        .any(|t| SeriesStatus::from_text(t) == SeriesStatus::Completed)
    {
        SeriesStatus::Completed
    } else {
        SeriesStatus::Ongoing
    }
}

fn extract_kind(doc: &Document) -> Option<SeriesKind> {
    doc.select(&SELECTORS.info_rows).find_map(|row| {
        let heading = row.select(&SELECTORS.info_heading).next().map(element_text)?;
        if !heading.to_lowercase().contains("type") {
            return None;
        }
        let content = row.select(&SELECTORS.info_content).next().map(element_text)?;
        SeriesKind::from_text(&content)
    })
}

fn joined_names(doc: &Document, selector: &Selector) -> Option<String> {
    let names = doc.all_texts(selector);
    (!names.is_empty()).then(|| names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://site.com/manga/my-series/").unwrap()
    }

    fn extract(html: &str) -> MetadataFields {
        extract_metadata(&Document::parse(html), &page())
    }

    #[test]
    fn test_empty_input_yields_defaults() {
        let fields = extract("");
        assert_eq!(fields.title, UNKNOWN_TITLE);
        assert_eq!(fields.description, "");
        assert_eq!(fields.thumbnail_url, "");
        assert!(fields.genres.is_empty());
        assert_eq!(fields.status, SeriesStatus::Ongoing);
        assert_eq!(fields.kind, SeriesKind::Manhwa);
        assert_eq!(fields.author, None);
    }

    #[test]
    fn test_plain_heading_title() {
        let fields = extract("<html><body><h1>My Series</h1></body></html>");
        assert_eq!(fields.title, "My Series");
    }

    #[test]
    fn test_title_chain_order() {
        let html = r#"<html><head>
            <title>Page Title</title>
            <meta property="og:title" content="OG Title">
        </head><body>
            <h1>Generic</h1>
            <div class="post-title"><h1>Theme Title</h1></div>
        </body></html>"#;
        assert_eq!(extract(html).title, "Theme Title");

        let html = r#"<div class="post-title"><h1>
            <span class="manga-title-badges hot">HOT</span> Solo Leveling
        </h1></div>"#;
        assert_eq!(extract(html).title, "Solo Leveling");

        let html = r#"<div class="post-title"><h1><span class="manga-title-badges new">NEW</span></h1></div>
            <meta property="og:title" content="OG Title">"#;
        assert_eq!(extract(html).title, "OG Title");

        let html = r#"<html><head>
            <title>Page Title</title>
            <meta property="og:title" content="OG Title">
        </head><body><h1>  </h1></body></html>"#;
        assert_eq!(extract(html).title, "OG Title");

        let html = "<html><head><title> Page Title </title></head></html>";
        assert_eq!(extract(html).title, "Page Title");
    }

    #[test]
    fn test_corrupted_og_description_falls_through() {
        let html = r#"<html><head>
            <meta property="og:description" content="[object Object]">
        </head><body>
            <div class="summary__content"><p>A hunter rises.</p></div>
        </body></html>"#;
        assert_eq!(extract(html).description, "A hunter rises.");
    }

    #[test]
    fn test_corrupted_description_everywhere_is_empty() {
        let html = r#"<html><head>
            <meta property="og:description" content="[object Object]">
            <meta name="description" content="x [object Object] y">
        </head><body><div class="series-synopsis">[object Object]</div></body></html>"#;
        assert_eq!(extract(html).description, "");
    }

    #[test]
    fn test_description_meta_fallback() {
        let html = r#"<head><meta name="description" content="From meta."></head>"#;
        assert_eq!(extract(html).description, "From meta.");
    }

    #[test]
    fn test_thumbnail_chain_and_resolution() {
        let html = r#"<div class="summary_image"><img data-src="/covers/x.jpg"></div>
            <meta property="og:image" content="https://site.com/og.jpg">"#;
        assert_eq!(extract(html).thumbnail_url, "https://site.com/covers/x.jpg");

        let html = r#"<meta name="twitter:image" content="https://cdn.site.com/tw.jpg">"#;
        assert_eq!(extract(html).thumbnail_url, "https://cdn.site.com/tw.jpg");
    }

    #[test]
    fn test_genres_deduplicated_in_order() {
        let html = r#"<div class="genres-content">
            <a>Action</a><a>Drama</a><a>Action</a>
        </div><div class="mgen"><a>Fantasy</a><a>Drama</a></div>"#;
        assert_eq!(extract(html).genres, vec!["Action", "Drama", "Fantasy"]);
    }

    #[test]
    fn test_status_detection() {
        let html = r#"<div class="post-status"><div class="summary-content"> COMPLETED </div></div>"#;
        assert_eq!(extract(html).status, SeriesStatus::Completed);

        let html = r#"<div class="post-status"><div class="summary-content">OnGoing</div></div>"#;
        assert_eq!(extract(html).status, SeriesStatus::Ongoing);
    }

    #[test]
    fn test_kind_and_credits() {
        let html = r#"
            <div class="post-content_item">
                <div class="summary-heading"><h5>Type</h5></div>
                <div class="summary-content">Manhua</div>
            </div>
            <div class="author-content"><a>Chugong</a></div>
            <div class="artist-content"><a>DUBU</a><a>Redice</a></div>"#;
        let fields = extract(html);
        assert_eq!(fields.kind, SeriesKind::Manhua);
        assert_eq!(fields.author.as_deref(), Some("Chugong"));
        assert_eq!(fields.artist.as_deref(), Some("DUBU, Redice"));
    }
}
