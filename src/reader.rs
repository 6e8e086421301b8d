//! Chapter page scraping for the reader.

use crate::document::{Document, image_source};
use crate::error::ScraperError;
use crate::fetcher::{FetchRequest, Transport, parse_url};
use crate::normalize::{RelayRewriter, origin_referer, resolve_url};
use scraper::Selector;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Page-image containers, in priority order.
static PAGE_IMAGE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".reading-content img",
        ".page-break img",
        "#chapter-video-frame img",
        ".entry-content img",
        ".vung-doc img",
        ".wp-manga-chapter-img",
        "#readerarea img",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Images of one chapter, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterPages {
    pub url: String,
    pub images: Vec<String>,
}

/// Absolute image URLs of a chapter page, selector by selector, first
/// occurrence kept.
pub fn extract_page_images(doc: &Document, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    PAGE_IMAGE_SELECTORS
        .iter()
        .flat_map(|selector| doc.select(selector).collect::<Vec<_>>())
        .filter_map(image_source)
        .filter_map(|src| resolve_url(page_url, &src))
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

/// Fetches a chapter page and lists its images, rewritten through `relay`
/// when given.
pub async fn scrape_chapter_pages(
    transport: &dyn Transport,
    raw_url: &str,
    relay: Option<&RelayRewriter>,
) -> Result<ChapterPages, ScraperError> {
    let url = parse_url(raw_url)?;
    let request = FetchRequest::get(url.clone()).with_referer(origin_referer(&url));
    let html = transport.fetch(request).await?.text();

    let images = extract_page_images(&Document::parse(&html), &url);
    tracing::debug!(url = %url, count = images.len(), "chapter images");

    let images = match relay {
        Some(relay) => images.iter().map(|src| relay.rewrite(src)).collect(),
        None => images,
    };

    Ok(ChapterPages {
        url: url.to_string(),
        images,
    })
}
