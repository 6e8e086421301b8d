//! Series listings scraped from a site homepage.

use crate::document::{Document, element_text, image_source};
use crate::error::ScraperError;
use crate::fetcher::{FetchRequest, SEARCH_REFERER, Transport, parse_url};
use crate::normalize::resolve_url;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static SERIES_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/manga/([^/?#]+)/?").unwrap());

struct Selectors {
    cards: Selector,
    anchor: Selector,
    image: Selector,
    series_links: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    cards: Selector::parse(".item-summary, .manga-item, .item, .post-title").unwrap(),
    anchor: Selector::parse("a[href]").unwrap(),
    image: Selector::parse("img").unwrap(),
    series_links: Selector::parse(r#"a[href*="/manga/"]"#).unwrap(),
});

/// One series found on a listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub slug: String,
    pub title: String,
    /// Absolute cover URL, empty when the listing shows none.
    pub thumbnail: String,
    /// Absolute series page URL.
    pub url: String,
}

fn series_slug(href: &str) -> Option<String> {
    SERIES_SLUG
        .captures(href)
        .map(|caps| caps[1].to_string())
        .filter(|slug| !slug.to_lowercase().contains("chapter"))
}

fn anchor_title(anchor: ElementRef) -> Option<String> {
    let text = element_text(anchor);
    if !text.is_empty() {
        return Some(text);
    }
    anchor
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn entry_from_anchor(anchor: ElementRef, thumbnail: String, page_url: &Url) -> Option<CatalogEntry> {
    let url = resolve_url(page_url, anchor.value().attr("href")?)?;
    let slug = series_slug(&url)?;
    let title = anchor_title(anchor)?;
    if title.to_lowercase().contains("chapter") {
        return None;
    }
    Some(CatalogEntry {
        slug,
        title,
        thumbnail,
        url,
    })
}

/// Lists the series linked from a homepage: card layouts first, then any
/// remaining `/manga/<slug>/` link. Chapter links and repeated slugs are
/// skipped.
pub fn extract_catalog(doc: &Document, page_url: &Url) -> Vec<CatalogEntry> {
    let from_cards = doc.select(&SELECTORS.cards).filter_map(|card| {
        let anchor = card.select(&SELECTORS.anchor).next()?;
        let thumbnail = card
            .select(&SELECTORS.image)
            .next()
            .and_then(image_source)
            .and_then(|src| resolve_url(page_url, &src))
            .unwrap_or_default();
        entry_from_anchor(anchor, thumbnail, page_url)
    });

    let from_links = doc
        .select(&SELECTORS.series_links)
        .filter_map(|anchor| entry_from_anchor(anchor, String::new(), page_url));

    let mut seen = HashSet::new();
    from_cards
        .chain(from_links)
        .filter(|entry| seen.insert(entry.slug.clone()))
        .collect()
}

/// Fetches `homepage` and lists its series.
pub async fn scrape_catalog(
    transport: &dyn Transport,
    homepage: &str,
) -> Result<Vec<CatalogEntry>, ScraperError> {
    let url = parse_url(homepage)?;
    let request = FetchRequest::get(url.clone()).with_referer(SEARCH_REFERER);
    let html = transport.fetch(request).await?.text();

    let entries = extract_catalog(&Document::parse(&html), &url);
    tracing::info!(url = %url, count = entries.len(), "catalog scraped");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubTransport;

    const HOME: &str = "https://site.com/";

    const HOMEPAGE: &str = r#"<html><body>
        <div class="page-item-detail">
            <div class="item-thumb"><img data-src="/covers/solo.jpg" src="data:image/gif;base64,AA"></div>
            <div class="item-summary">
                <div class="post-title"><a href="/manga/solo-leveling/">Solo Leveling</a></div>
                <img src="/covers/solo.jpg">
            </div>
        </div>
        <div class="item-summary">
            <a href="https://site.com/manga/tower-of-god/" title="Tower of God"></a>
        </div>
        <a href="/manga/solo-leveling/chapter-200/">Chapter 200</a>
        <a href="/manga/omniscient-reader/">Omniscient Reader</a>
        <a href="/manga/solo-leveling/">Solo Leveling again</a>
        <a href="/genre/action/">Action</a>
    </body></html>"#;

    fn home() -> Url {
        Url::parse(HOME).unwrap()
    }

    #[test]
    fn test_series_slug() {
        assert_eq!(series_slug("https://site.com/manga/solo-leveling/").as_deref(), Some("solo-leveling"));
        assert_eq!(series_slug("https://site.com/manga/x?ref=home").as_deref(), Some("x"));
        assert_eq!(series_slug("https://site.com/genre/action/"), None);
        assert_eq!(series_slug("https://site.com/manga/chapter-list/"), None);
    }

    #[test]
    fn test_extract_catalog() {
        let entries = extract_catalog(&Document::parse(HOMEPAGE), &home());
        let slugs: Vec<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["solo-leveling", "tower-of-god", "omniscient-reader"]);

        assert_eq!(entries[0].title, "Solo Leveling");
        assert_eq!(entries[0].thumbnail, "https://site.com/covers/solo.jpg");
        assert_eq!(entries[0].url, "https://site.com/manga/solo-leveling/");
        assert_eq!(entries[1].title, "Tower of God");
        assert_eq!(entries[2].thumbnail, "");
    }

    #[test]
    fn test_empty_page() {
        assert!(extract_catalog(&Document::parse(""), &home()).is_empty());
    }

    #[tokio::test]
    async fn test_scrape_catalog() {
        let transport = StubTransport::new().with_page(HOME, HOMEPAGE);
        let entries = scrape_catalog(&transport, HOME).await.unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn test_scrape_catalog_blocked() {
        let transport = StubTransport::new();
        let err = scrape_catalog(&transport, HOME).await.unwrap_err();
        assert!(matches!(err, ScraperError::Blocked { status: 404, .. }));
    }
}
