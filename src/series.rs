//! The series scraping pipeline.
//!
//! Fetch the page, pull metadata and chapter candidates out of it, run
//! discovery (which may issue one AJAX request), then normalize.

use crate::chapters::{Discovery, DiscoveryPlan, DiscoveryStrategy, chapter_url_pattern, discover};
use crate::document::Document;
use crate::error::ScraperError;
use crate::fetcher::{FetchRequest, SEARCH_REFERER, Transport, parse_url};
use crate::metadata::{MetadataFields, extract_metadata};
use crate::model::SeriesMetadata;
use crate::normalize::{Normalizer, trim_base_url};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Chapter numbering detected on a series page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDetection {
    pub base_url: String,
    pub first_chapter: f64,
    pub last_chapter: f64,
    pub total_chapters: usize,
    pub chapter_url_pattern: String,
    pub detected_chapters: Vec<f64>,
    pub strategy: DiscoveryStrategy,
}

/// Parses a fetched page into owned metadata and a discovery plan.
fn inspect_page(html: &str, url: &Url) -> (MetadataFields, DiscoveryPlan) {
    let doc = Document::parse(html);
    (extract_metadata(&doc, url), DiscoveryPlan::from_document(&doc, url))
}

fn assemble(fields: MetadataFields, url: &Url, discovery: Discovery) -> SeriesMetadata {
    SeriesMetadata {
        title: fields.title,
        description: fields.description,
        thumbnail_url: fields.thumbnail_url,
        status: fields.status,
        kind: fields.kind,
        genres: fields.genres,
        author: fields.author,
        artist: fields.artist,
        source_url: url.to_string(),
        chapters: discovery.chapters,
        range: discovery.range,
    }
}

/// Scrapes series pages into normalized [`SeriesMetadata`].
#[derive(Clone)]
pub struct SeriesScraper {
    transport: Arc<dyn Transport>,
    normalizer: Normalizer,
}

impl SeriesScraper {
    pub fn new(transport: Arc<dyn Transport>, normalizer: Normalizer) -> Self {
        Self {
            transport,
            normalizer,
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    async fn scrape_with_strategy(
        &self,
        raw_url: &str,
    ) -> Result<(SeriesMetadata, DiscoveryStrategy), ScraperError> {
        let url = parse_url(raw_url)?;
        tracing::info!(url = %url, "scraping series");

        let request = FetchRequest::get(url.clone()).with_referer(SEARCH_REFERER);
        let html = self.transport.fetch(request).await?.text();

        let (fields, plan) = inspect_page(&html, &url);
        let discovery = discover(self.transport.as_ref(), &plan).await;
        let strategy = discovery.strategy;

        let series = self.normalizer.normalize(assemble(fields, &url, discovery));
        tracing::info!(
            title = %series.title,
            chapters = series.chapters.len(),
            strategy = ?strategy,
            "series scraped"
        );
        Ok((series, strategy))
    }

    /// Scrapes one series page. Only fetch failures and bad URLs are errors;
    /// missing fields fall back to defaults.
    pub async fn scrape(&self, raw_url: &str) -> Result<SeriesMetadata, ScraperError> {
        Ok(self.scrape_with_strategy(raw_url).await?.0)
    }

    /// Reports the chapter numbering of a series page.
    pub async fn detect(&self, raw_url: &str) -> Result<ChapterDetection, ScraperError> {
        let (series, strategy) = self.scrape_with_strategy(raw_url).await?;
        let base_url = trim_base_url(raw_url.trim()).to_string();

        Ok(ChapterDetection {
            chapter_url_pattern: chapter_url_pattern(&base_url),
            base_url,
            first_chapter: series.range.min,
            last_chapter: series.range.max,
            total_chapters: series.chapters.len(),
            detected_chapters: series.chapters.iter().map(|c| c.number).collect(),
            strategy,
        })
    }
}
