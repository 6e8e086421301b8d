//! Preview and import of series into the store.

use crate::catalog::{CatalogEntry, scrape_catalog};
use crate::chapters::{check_range, synthesize_range};
use crate::config::ImportConfig;
use crate::error::ScraperError;
use crate::model::{ChapterRange, SeriesMetadata, format_number};
use crate::series::SeriesScraper;
use crate::store::SeriesStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shown in previews when the series has no description.
const NO_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Preview,
    #[default]
    Import,
}

/// Inclusive chapter span; missing ends default to the detected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterSpan {
    pub from: Option<u32>,
    pub to: Option<u32>,
}

/// A preview or import request, as sent by the bot and the web UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRequest {
    pub url: String,
    pub mode: ImportMode,
    pub range: Option<ChapterSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPreview {
    pub title: String,
    pub thumbnail: String,
    pub description: String,
    pub total_chapters: usize,
    pub range_start: f64,
    pub range_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub title: String,
    pub series_id: String,
    pub imported_count: usize,
    /// "from-to"
    pub range: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ImportOutcome {
    Preview(SeriesPreview),
    Import(ImportSummary),
}

/// Result of a batch import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Series listed on the homepage.
    pub total: usize,
    pub processed: usize,
    pub imported: usize,
    /// Already stored under the same title.
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Cuts `text` to `max_chars` characters, appending "..." when shortened.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Resolves the import span against the detected range. Fractional bounds
/// are floored.
pub fn resolve_span(span: Option<ChapterSpan>, detected: ChapterRange) -> (u32, u32) {
    let span = span.unwrap_or_default();
    let floor = |n: f64| n.floor().max(0.0) as u32;
    (
        span.from.unwrap_or_else(|| floor(detected.min)),
        span.to.unwrap_or_else(|| floor(detected.max)),
    )
}

/// Runs previews and imports against an injected store.
#[derive(Clone)]
pub struct ImportService {
    scraper: Arc<SeriesScraper>,
    store: Arc<dyn SeriesStore>,
    config: ImportConfig,
}

impl ImportService {
    pub fn new(scraper: Arc<SeriesScraper>, store: Arc<dyn SeriesStore>, config: ImportConfig) -> Self {
        Self {
            scraper,
            store,
            config,
        }
    }

    /// Dispatches on the request mode.
    pub async fn handle(&self, request: ImportRequest) -> Result<ImportOutcome, ScraperError> {
        tracing::info!(url = %request.url, mode = ?request.mode, "import request");
        match request.mode {
            ImportMode::Preview => Ok(ImportOutcome::Preview(self.preview(&request.url).await?)),
            ImportMode::Import => Ok(ImportOutcome::Import(
                self.import(&request.url, request.range).await?,
            )),
        }
    }

    pub async fn preview(&self, url: &str) -> Result<SeriesPreview, ScraperError> {
        let series = self.scraper.scrape(url).await?;
        let description = if series.description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            truncate_description(&series.description, self.config.preview_description_chars)
        };

        Ok(SeriesPreview {
            title: series.title,
            thumbnail: series.thumbnail_url,
            description,
            total_chapters: series.chapters.len(),
            range_start: series.range.min,
            range_end: series.range.max,
        })
    }

    /// Scrapes `url`, stores the series and a synthetic chapter list over
    /// `span` (the detected range by default). Spans longer than
    /// `import.max_range_chapters` are rejected. If the chapters cannot be
    /// stored the series is removed again, so a retry does not conflict.
    pub async fn import(
        &self,
        url: &str,
        span: Option<ChapterSpan>,
    ) -> Result<ImportSummary, ScraperError> {
        let series = self.scraper.scrape(url).await?;
        let (from, to) = resolve_span(span, series.range);
        check_range(from, to, self.config.max_range_chapters)?;
        let chapters = synthesize_range(url, from, to)?;

        let series_id = self.store.insert_series(&series).await?;
        let imported_count = match self.store.insert_chapters(&series_id, &chapters).await {
            Ok(count) => count,
            Err(e) => {
                if let Err(cleanup) = self.store.remove_series(&series_id).await {
                    tracing::warn!(id = %series_id, error = %cleanup, "failed to roll back series");
                }
                return Err(e.into());
            }
        };
        tracing::info!(title = %series.title, id = %series_id, imported_count, "series imported");

        Ok(ImportSummary {
            message: format!(
                "Successfully imported \"{}\" ({} chapters).",
                series.title, imported_count
            ),
            title: series.title,
            series_id,
            imported_count,
            range: format!("{}-{}", from, to),
        })
    }

    /// Stores one catalog entry with its discovered chapters. Returns false
    /// when a series with the same title is already stored.
    async fn import_entry(&self, entry: &CatalogEntry) -> Result<bool, ScraperError> {
        let series: SeriesMetadata = self.scraper.scrape(&entry.url).await?;
        if self.store.find_by_title(&series.title).await?.is_some() {
            tracing::debug!(title = %series.title, "already stored, skipping");
            return Ok(false);
        }

        let series_id = self.store.insert_series(&series).await?;
        if let Err(e) = self.store.insert_chapters(&series_id, &series.chapters).await {
            tracing::warn!(id = %series_id, error = %e, "failed to store chapters");
        }
        tracing::info!(
            title = %series.title,
            last_chapter = %format_number(series.last_chapter()),
            "series imported"
        );
        Ok(true)
    }

    /// Imports up to `limit` series listed on `homepage`, one at a time with
    /// the configured delay between them.
    pub async fn import_catalog(
        &self,
        homepage: &str,
        limit: Option<usize>,
    ) -> Result<BatchReport, ScraperError> {
        let entries = scrape_catalog(self.scraper.transport(), homepage).await?;
        let limit = limit.unwrap_or(self.config.batch_limit);
        let delay = Duration::from_millis(self.config.batch_delay_ms);

        let mut report = BatchReport {
            total: entries.len(),
            ..BatchReport::default()
        };

        for (index, entry) in entries.iter().take(limit).enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            report.processed += 1;
            match self.import_entry(entry).await {
                Ok(true) => report.imported += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(slug = %entry.slug, error = %e, "import failed");
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", entry.slug, e));
                }
            }
        }

        Ok(report)
    }
}
