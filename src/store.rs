//! Persistence interface for scraped series.
//!
//! The scraping core never talks to a concrete store; callers inject an
//! `Arc<dyn SeriesStore>`. [`JsonDirStore`] is the bundled adapter, keeping
//! one pretty-printed JSON file per series.

use crate::error::StoreError;
use crate::model::{ChapterRange, ChapterRef, SeriesMetadata, dedupe_and_sort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Storage collaborator used by the import service.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// ID of the series with exactly this title, if stored.
    async fn find_by_title(&self, title: &str) -> Result<Option<String>, StoreError>;

    /// Stores a new series and returns its ID. Chapters are added separately.
    /// Fails with [`StoreError::Conflict`] when a series with the same title
    /// is already stored.
    async fn insert_series(&self, series: &SeriesMetadata) -> Result<String, StoreError>;

    /// Deletes a stored series and its chapters.
    async fn remove_series(&self, series_id: &str) -> Result<(), StoreError>;

    /// Adds chapters to a stored series, skipping numbers it already has.
    /// Returns how many were added.
    async fn insert_chapters(
        &self,
        series_id: &str,
        chapters: &[ChapterRef],
    ) -> Result<usize, StoreError>;
}

/// On-disk record of one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSeries {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub series: SeriesMetadata,
}

/// File-system slug for a title: lowercase alphanumerics (any script) joined
/// by single dashes.
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "series".to_string()
    } else {
        slug
    }
}

/// [`SeriesStore`] backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Loads a stored series by ID.
    pub async fn load(&self, id: &str) -> Result<StoredSeries, StoreError> {
        let content = match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, record: &StoredSeries) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.path_for(&record.id), content).await?;
        Ok(())
    }

    /// Every stored series, in no particular order.
    pub async fn list(&self) -> Result<Vec<StoredSeries>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<StoredSeries>(&content) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SeriesStore for JsonDirStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| record.series.title == title)
            .map(|record| record.id))
    }

    async fn insert_series(&self, series: &SeriesMetadata) -> Result<String, StoreError> {
        let base = slugify(&series.title);
        let mut id = base.clone();
        let mut suffix = 1;
        // Distinct titles sharing a slug get "-2", "-3", ...
        loop {
            match self.load(&id).await {
                Ok(existing) if existing.series.title == series.title => {
                    return Err(StoreError::Conflict(series.title.clone()));
                }
                Ok(_) => {
                    suffix += 1;
                    id = format!("{}-{}", base, suffix);
                }
                Err(StoreError::NotFound(_)) => break,
                Err(e) => return Err(e),
            }
        }

        let record = StoredSeries {
            id: id.clone(),
            created_at: Utc::now(),
            series: SeriesMetadata {
                chapters: Vec::new(),
                range: ChapterRange::DEGENERATE,
                ..series.clone()
            },
        };
        self.save(&record).await?;
        tracing::debug!(id = %id, dir = %self.dir.display(), "series stored");
        Ok(id)
    }

    async fn remove_series(&self, series_id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(series_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(series_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_chapters(
        &self,
        series_id: &str,
        chapters: &[ChapterRef],
    ) -> Result<usize, StoreError> {
        let mut record = self.load(series_id).await?;

        let existing: HashSet<u64> = record
            .series
            .chapters
            .iter()
            .map(|c| c.number.to_bits())
            .collect();
        let fresh: Vec<ChapterRef> = dedupe_and_sort(
            chapters
                .iter()
                .filter(|c| !existing.contains(&c.number.to_bits()))
                .cloned()
                .collect(),
        );
        let added = fresh.len();

        let mut all = std::mem::take(&mut record.series.chapters);
        all.extend(fresh);
        record.series.chapters = dedupe_and_sort(all);
        record.series.range = ChapterRange::of(&record.series.chapters);

        self.save(&record).await?;
        Ok(added)
    }
}
