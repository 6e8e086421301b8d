//! Normalization of scraped records.
//!
//! Everything here is idempotent: feeding a normalized record back through
//! [`Normalizer::normalize`] returns it unchanged.

use crate::config::{RelayConfig, SourcesConfig};
use crate::model::{ChapterRange, SeriesMetadata, UNKNOWN_TITLE, dedupe_and_sort};
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Markers some source sites emit instead of a real synopsis.
const BROKEN_DESCRIPTION_MARKERS: &[&str] = &["[object Object]"];

/// Strips a single trailing slash from a base URL.
pub fn trim_base_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Canonical chapter URL for `number` under `base`.
pub fn chapter_url(base: &str, number: u32) -> String {
    format!("{}/chapter-{}/", trim_base_url(base), number)
}

/// Resolves `raw` against `base`, keeping only http(s) results.
pub fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// `Referer` value naming the origin of `url`, e.g. `https://host/`.
pub fn origin_referer(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

/// Returns true if a description is one of the known corrupted values.
pub fn is_broken_description(text: &str) -> bool {
    BROKEN_DESCRIPTION_MARKERS.iter().any(|m| text.contains(m))
}

/// Trims a description and collapses broken values to an empty string.
pub fn clean_description(text: &str) -> String {
    let text = text.trim();
    if is_broken_description(text) {
        String::new()
    } else {
        text.to_string()
    }
}

/// Removes configured site-name suffixes from titles.
#[derive(Debug, Clone)]
pub struct TitleCleaner {
    patterns: Vec<Regex>,
}

impl TitleCleaner {
    /// Builds one pattern per suffix, matching " - Name" or " | Name" at the end.
    pub fn new(suffixes: &[String]) -> Self {
        let patterns = suffixes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| Regex::new(&format!(r"(?i)\s+[-|–]\s+{}\s*$", regex::escape(s))).ok())
            .collect();
        Self { patterns }
    }

    /// Strips suffixes until none applies; an empty result becomes the placeholder.
    pub fn clean(&self, title: &str) -> String {
        let mut current = title.trim().to_string();
        loop {
            let stripped = self
                .patterns
                .iter()
                .fold(current.clone(), |acc, p| p.replace(&acc, "").trim().to_string());
            if stripped == current {
                break;
            }
            current = stripped;
        }

        if current.is_empty() {
            UNKNOWN_TITLE.to_string()
        } else {
            current
        }
    }
}

/// Rewrites third-party image URLs to go through the image relay.
#[derive(Debug, Clone)]
pub struct RelayRewriter {
    route: String,
}

impl RelayRewriter {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }

    /// The relay route, e.g. `/api/proxy`.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the relayed form of `url`; relayed, empty or non-http input is
    /// returned as is.
    pub fn rewrite(&self, url: &str) -> String {
        let url = url.trim();
        let is_remote = url.starts_with("http://") || url.starts_with("https://");
        if !is_remote || self.is_relayed(url) {
            return url.to_string();
        }

        let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
        format!("{}?url={}", self.route, encoded)
    }

    fn is_relayed(&self, url: &str) -> bool {
        url.starts_with(&format!("{}?", self.route))
    }
}

/// Applies every cleanup step to a [`SeriesMetadata`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    titles: TitleCleaner,
    relay: Option<RelayRewriter>,
}

impl Normalizer {
    pub fn new(sources: &SourcesConfig, relay: &RelayConfig) -> Self {
        Self {
            titles: TitleCleaner::new(&sources.title_suffixes),
            relay: relay
                .rewrite_images
                .then(|| RelayRewriter::new(relay.route.clone())),
        }
    }

    /// The relay rewriter, when image rewriting is enabled.
    pub fn relay(&self) -> Option<&RelayRewriter> {
        self.relay.as_ref()
    }

    /// Cleans a raw title.
    pub fn title(&self, raw: &str) -> String {
        self.titles.clean(raw)
    }

    /// Rewrites an image URL through the relay if enabled.
    pub fn image_url(&self, url: &str) -> String {
        match &self.relay {
            Some(relay) => relay.rewrite(url),
            None => url.trim().to_string(),
        }
    }

    pub fn normalize(&self, series: SeriesMetadata) -> SeriesMetadata {
        let mut seen = HashSet::new();
        let genres = series
            .genres
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty() && seen.insert(g.clone()))
            .collect();

        let chapters = dedupe_and_sort(series.chapters);
        let range = ChapterRange::of(&chapters);

        SeriesMetadata {
            title: self.title(&series.title),
            description: clean_description(&series.description),
            thumbnail_url: self.image_url(&series.thumbnail_url),
            genres,
            author: series.author.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            artist: series.artist.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            chapters,
            range,
            ..series
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterRef, SeriesKind, SeriesStatus};
    use chrono::Utc;

    fn normalizer() -> Normalizer {
        Normalizer::new(&SourcesConfig::default(), &RelayConfig::default())
    }

    fn sample() -> SeriesMetadata {
        let now = Utc::now();
        SeriesMetadata {
            title: "  Solo Leveling | Asura Scans - Manhwa-Raw ".to_string(),
            description: "[object Object]".to_string(),
            thumbnail_url: "https://cdn.site.com/covers/solo leveling.jpg".to_string(),
            status: SeriesStatus::Ongoing,
            kind: SeriesKind::Manhwa,
            genres: vec![" Action".to_string(), "Action".to_string(), "Fantasy".to_string()],
            author: Some("  ".to_string()),
            artist: None,
            source_url: "https://site.com/manga/solo-leveling/".to_string(),
            chapters: vec![
                ChapterRef {
                    number: 2.0,
                    title: "Chapter 2".to_string(),
                    content_url: "https://site.com/manga/solo-leveling/chapter-2/".to_string(),
                    released_at: now,
                    inferred: false,
                },
                ChapterRef {
                    number: 1.0,
                    title: "Chapter 1".to_string(),
                    content_url: "https://site.com/manga/solo-leveling/chapter-1/".to_string(),
                    released_at: now,
                    inferred: false,
                },
            ],
            range: ChapterRange::DEGENERATE,
        }
    }

    #[test]
    fn test_trim_base_url_strips_one_slash() {
        assert_eq!(trim_base_url("https://a.com/x/"), "https://a.com/x");
        assert_eq!(trim_base_url("https://a.com/x"), "https://a.com/x");
        assert_eq!(trim_base_url("https://a.com/x//"), "https://a.com/x/");
    }

    #[test]
    fn test_chapter_url_template() {
        assert_eq!(
            chapter_url("https://example.com/series-x/", 5),
            "https://example.com/series-x/chapter-5/"
        );
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://site.com/manga/x/").unwrap();
        assert_eq!(
            resolve_url(&base, "/manga/x/chapter-2/").as_deref(),
            Some("https://site.com/manga/x/chapter-2/")
        );
        assert_eq!(
            resolve_url(&base, "chapter-3/").as_deref(),
            Some("https://site.com/manga/x/chapter-3/")
        );
        assert_eq!(
            resolve_url(&base, "//cdn.site.com/a.jpg").as_deref(),
            Some("https://cdn.site.com/a.jpg")
        );
        assert_eq!(resolve_url(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_url(&base, "  "), None);
    }

    #[test]
    fn test_origin_referer() {
        let url = Url::parse("https://img.site.com:8443/a/b.jpg?x=1").unwrap();
        assert_eq!(origin_referer(&url), "https://img.site.com:8443/");
    }

    #[test]
    fn test_title_suffixes_stripped_repeatedly() {
        let cleaner = TitleCleaner::new(&SourcesConfig::default().title_suffixes);
        assert_eq!(cleaner.clean("Solo Leveling - Asura Scans"), "Solo Leveling");
        assert_eq!(cleaner.clean("Solo Leveling | MANHWARAW"), "Solo Leveling");
        assert_eq!(
            cleaner.clean("Solo Leveling | Asura Scans - Manhwa-Raw"),
            "Solo Leveling"
        );
        assert_eq!(cleaner.clean("Asura Scans"), "Asura Scans");
        assert_eq!(cleaner.clean("   "), UNKNOWN_TITLE);
    }

    #[test]
    fn test_relay_rewrite() {
        let relay = RelayRewriter::new("/api/proxy");
        let rewritten = relay.rewrite("https://cdn.site.com/a b.jpg");
        assert_eq!(
            rewritten,
            "/api/proxy?url=https%3A%2F%2Fcdn.site.com%2Fa+b.jpg"
        );
        assert_eq!(relay.rewrite(&rewritten), rewritten);
        assert_eq!(relay.rewrite(""), "");
        assert_eq!(relay.rewrite("/local/a.jpg"), "/local/a.jpg");
    }

    #[test]
    fn test_normalize_cleans_record() {
        let out = normalizer().normalize(sample());
        assert_eq!(out.title, "Solo Leveling");
        assert_eq!(out.description, "");
        assert!(out.thumbnail_url.starts_with("/api/proxy?url="));
        assert_eq!(out.genres, vec!["Action", "Fantasy"]);
        assert_eq!(out.author, None);
        assert_eq!(out.chapters[0].number, 1.0);
        assert_eq!(out.range, ChapterRange { min: 1.0, max: 2.0 });
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = normalizer();
        let once = normalizer.normalize(sample());
        let twice = normalizer.normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_disabled() {
        let relay = RelayConfig {
            rewrite_images: false,
            ..RelayConfig::default()
        };
        let normalizer = Normalizer::new(&SourcesConfig::default(), &relay);
        let out = normalizer.normalize(sample());
        assert_eq!(
            out.thumbnail_url,
            "https://cdn.site.com/covers/solo leveling.jpg"
        );
    }
}
