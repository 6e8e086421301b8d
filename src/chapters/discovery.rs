//! Chapter discovery strategies.
//!
//! Madara-themed sites load their chapter list through `admin-ajax.php`
//! once the series ID is known; everything else (and Madara sites whose AJAX
//! endpoint misbehaves) is read from the links already on the page.

use super::ChapterLink;
use super::dates::parse_release_date;
use super::rules::extract_number;
use crate::document::{Document, attr_with_fallback, element_text};
use crate::error::ScraperError;
use crate::fetcher::{FetchRequest, Transport};
use crate::model::{ChapterRange, ChapterRef, dedupe_and_sort, default_chapter_title};
use crate::normalize::resolve_url;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

const AJAX_PATH: &str = "/wp-admin/admin-ajax.php";
const AJAX_ACTION: &str = "manga_get_chapters";

struct Selectors {
    rating_post_id: Selector,
    manga_id_input: Selector,
    chapters_holder: Selector,
    any_data_id: Selector,
    scripts: Selector,
    list_items: Selector,
    anchors: Selector,
    release_date: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            rating_post_id: Selector::parse(".rating-post-id").unwrap(),
            manga_id_input: Selector::parse(r#"input[name="manga-id"]"#).unwrap(),
            chapters_holder: Selector::parse("#manga-chapters-holder[data-id]").unwrap(),
            any_data_id: Selector::parse("[data-id]").unwrap(),
            scripts: Selector::parse("script").unwrap(),
            list_items: Selector::parse(
                ".main.version-chap li, li.wp-manga-chapter, .wp-manga-chapter, .chp-release-list li, .eplister li, #chapterlist li",
            )
            .unwrap(),
            anchors: Selector::parse("a[href]").unwrap(),
            release_date: Selector::parse(".chapter-release-date, .post-on").unwrap(),
        }
    }
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(Selectors::new);

static MANGA_ID_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"manga_id\s*=\s*['"]?(\d+)"#).unwrap());

/// Which strategy produced the chapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    Ajax,
    Static,
    /// Neither strategy found anything.
    Empty,
}

/// Deduplicated, sorted chapters plus their range.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub chapters: Vec<ChapterRef>,
    pub range: ChapterRange,
    pub strategy: DiscoveryStrategy,
}

impl Discovery {
    fn new(chapters: Vec<ChapterRef>, strategy: DiscoveryStrategy) -> Self {
        let chapters = dedupe_and_sort(chapters);
        if chapters.is_empty() {
            return Self::empty();
        }
        Self {
            range: ChapterRange::of(&chapters),
            chapters,
            strategy,
        }
    }

    pub fn empty() -> Self {
        Self {
            chapters: Vec::new(),
            range: ChapterRange::DEGENERATE,
            strategy: DiscoveryStrategy::Empty,
        }
    }
}

/// Everything discovery needs from the series page, extracted up front so
/// the page tree can be dropped before any request is made.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPlan {
    pub page_url: Url,
    /// Numeric Madara series ID, if the page exposes one.
    pub series_id: Option<String>,
    pub static_links: Vec<ChapterLink>,
}

impl DiscoveryPlan {
    pub fn from_document(doc: &Document, page_url: &Url) -> Self {
        Self {
            page_url: page_url.clone(),
            series_id: find_series_id(doc),
            static_links: collect_static_links(doc, page_url),
        }
    }
}

fn is_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Finds the numeric series ID a Madara page embeds for its AJAX calls.
pub fn find_series_id(doc: &Document) -> Option<String> {
    let s = &*SELECTORS;
    let first_attr = |selector: &Selector, attrs: &[&str]| {
        doc.select(selector)
            .next()
            .and_then(|el| attr_with_fallback(el, attrs))
    };

    let from_markup = [
        first_attr(&s.rating_post_id, &["value", "data-id"]),
        first_attr(&s.manga_id_input, &["value"]),
        first_attr(&s.chapters_holder, &["data-id"]),
        first_attr(&s.any_data_id, &["data-id"]),
    ];

    from_markup
        .into_iter()
        .flatten()
        .find(|id| is_numeric_id(id))
        .or_else(|| {
            doc.select(&s.scripts).find_map(|script| {
                let code: String = script.text().collect();
                MANGA_ID_SCRIPT
                    .captures(&code)
                    .map(|caps| caps[1].to_string())
            })
        })
}

/// The chapter-list item enclosing `anchor`, if any.
fn enclosing_item(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| SELECTORS.list_items.matches(el))
}

fn release_text(item: ElementRef) -> Option<String> {
    item.select(&SELECTORS.release_date)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn href_mentions_chapter(href: &str) -> bool {
    href.to_lowercase().contains("chapter")
}

fn to_link(anchor: ElementRef, item: Option<ElementRef>, page_url: &Url) -> Option<ChapterLink> {
    let href = resolve_url(page_url, anchor.value().attr("href")?)?;
    Some(ChapterLink {
        href,
        text: element_text(anchor),
        in_list: item.is_some(),
        released: item.and_then(release_text),
    })
}

/// Static candidates: the first anchor of each chapter-list item plus any
/// anchor whose href mentions "chapter", in document order, unique by href.
pub fn collect_static_links(doc: &Document, page_url: &Url) -> Vec<ChapterLink> {
    let mut seen = HashSet::new();
    doc.select(&SELECTORS.anchors)
        .filter_map(|anchor| {
            let item = enclosing_item(anchor);
            let leads_item = item
                .and_then(|i| i.select(&SELECTORS.anchors).next())
                .is_some_and(|first| first.id() == anchor.id());
            let href = anchor.value().attr("href").unwrap_or_default();

            if leads_item || href_mentions_chapter(href) {
                to_link(anchor, item, page_url)
            } else {
                None
            }
        })
        .filter(|link| seen.insert(link.href.clone()))
        .collect()
}

/// Candidates from an AJAX chapter-list fragment: anchors whose href
/// mentions "chapter", unique by href.
pub fn collect_ajax_links(html: &str, page_url: &Url) -> Vec<ChapterLink> {
    let fragment = Document::parse_fragment(html);
    let mut seen = HashSet::new();
    fragment
        .select(&SELECTORS.anchors)
        .filter(|anchor| href_mentions_chapter(anchor.value().attr("href").unwrap_or_default()))
        .filter_map(|anchor| to_link(anchor, enclosing_item(anchor), page_url))
        .filter(|link| seen.insert(link.href.clone()))
        .collect()
}

/// Picks a number for an unnumbered link that no other chapter holds.
///
/// `preferred` is used when free. Otherwise the number lands just above
/// `anchor`, the next older numbered chapter, halving the offset until it
/// is free; past that it goes after every claimed number.
fn free_number(claimed: &HashSet<u64>, preferred: f64, anchor: f64) -> f64 {
    if !claimed.contains(&preferred.to_bits()) {
        return preferred;
    }

    let mut offset = 0.5;
    while offset > 1e-6 {
        let candidate = anchor + offset;
        if !claimed.contains(&candidate.to_bits()) {
            return candidate;
        }
        offset /= 2.0;
    }

    claimed
        .iter()
        .map(|bits| f64::from_bits(*bits))
        .fold(anchor, f64::max)
        .floor()
        + 1.0
}

/// Assigns numbers, titles and release dates to candidate links.
///
/// A link no rule can number gets `len - index` (lists run newest first)
/// and is flagged as inferred. When that number belongs to another link it
/// is placed just after the next older numbered chapter instead, so no link
/// is lost to deduplication.
pub fn number_links(links: Vec<ChapterLink>, now: DateTime<Utc>) -> Vec<ChapterRef> {
    let total = links.len();
    let matched: Vec<Option<f64>> = links
        .iter()
        .map(|link| extract_number(link).map(|(number, _)| number))
        .collect();
    let mut claimed: HashSet<u64> = matched.iter().flatten().map(|n| n.to_bits()).collect();

    links
        .into_iter()
        .enumerate()
        .map(|(index, link)| {
            let (number, inferred) = match matched[index] {
                Some(number) => (number, false),
                None => {
                    let anchor = matched[index + 1..]
                        .iter()
                        .flatten()
                        .next()
                        .copied()
                        .unwrap_or(0.0);
                    let number = free_number(&claimed, (total - index) as f64, anchor);
                    claimed.insert(number.to_bits());
                    (number, true)
                }
            };
            let title = if link.text.is_empty() {
                default_chapter_title(number)
            } else {
                link.text
            };
            let released_at = link
                .released
                .as_deref()
                .and_then(|text| parse_release_date(text, now))
                .unwrap_or(now);

            ChapterRef {
                number,
                title,
                content_url: link.href,
                released_at,
                inferred,
            }
        })
        .collect()
}

async fn fetch_ajax_links(
    transport: &dyn Transport,
    page_url: &Url,
    series_id: &str,
) -> Result<Vec<ChapterLink>, ScraperError> {
    let ajax_url = page_url
        .join(AJAX_PATH)
        .map_err(|e| ScraperError::InvalidUrl(format!("{}: {}", page_url, e)))?;
    let request = FetchRequest::post_form(
        ajax_url,
        &[("action", AJAX_ACTION), ("manga", series_id)],
    )
    .with_referer(page_url.as_str());

    let response = transport.fetch(request).await?;
    Ok(collect_ajax_links(&response.text(), page_url))
}

/// Runs the AJAX strategy when a series ID is known, falling back to the
/// static links when it fails or finds nothing. Never fails.
pub async fn discover(transport: &dyn Transport, plan: &DiscoveryPlan) -> Discovery {
    let now = Utc::now();

    if let Some(series_id) = &plan.series_id {
        match fetch_ajax_links(transport, &plan.page_url, series_id).await {
            Ok(links) if !links.is_empty() => {
                tracing::debug!(count = links.len(), series_id = %series_id, "AJAX chapter list");
                return Discovery::new(number_links(links, now), DiscoveryStrategy::Ajax);
            }
            Ok(_) => {
                tracing::debug!(series_id = %series_id, "AJAX chapter list was empty");
            }
            Err(e) => {
                tracing::warn!(
                    url = %plan.page_url,
                    series_id = %series_id,
                    error = %e,
                    "AJAX chapter listing failed, using page links"
                );
            }
        }
    }

    let chapters = number_links(plan.static_links.clone(), now);
    Discovery::new(chapters, DiscoveryStrategy::Static)
}
