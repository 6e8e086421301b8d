//! Canonical records produced by a scrape.
//!
//! Every value here is built fresh per call and handed straight to the
//! caller; nothing in the crate keeps them around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Placeholder used whenever no title can be extracted.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Publication status of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeriesStatus {
    #[default]
    Ongoing,
    Completed,
}

impl SeriesStatus {
    /// Maps free-form status text; anything containing "complet" is completed.
    pub fn from_text(text: &str) -> Self {
        if text.to_lowercase().contains("complet") {
            SeriesStatus::Completed
        } else {
            SeriesStatus::Ongoing
        }
    }
}

/// Origin of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeriesKind {
    #[default]
    Manhwa,
    Manhua,
    Manga,
}

impl SeriesKind {
    /// Recognizes a kind label such as "Manhua" or "Korean Manhwa".
    pub fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("manhua") {
            Some(SeriesKind::Manhua)
        } else if lower.contains("manhwa") {
            Some(SeriesKind::Manhwa)
        } else if lower.contains("manga") {
            Some(SeriesKind::Manga)
        } else {
            None
        }
    }
}

/// One chapter of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRef {
    /// Ordering and deduplication key; may be fractional (12.5).
    pub number: f64,

    /// Display label, "Chapter {number}" when the source had none.
    pub title: String,

    /// Absolute http(s) URL of the reading page.
    pub content_url: String,

    /// Publish date, or the extraction time when the page shows none.
    pub released_at: DateTime<Utc>,

    /// The number was synthesized from list position, not read from the page.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inferred: bool,
}

/// Lowest and highest detected chapter numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub min: f64,
    pub max: f64,
}

impl ChapterRange {
    /// Range reported when nothing was found.
    pub const DEGENERATE: ChapterRange = ChapterRange { min: 1.0, max: 1.0 };

    /// Computes the range of `chapters`, or `{1, 1}` when empty.
    pub fn of(chapters: &[ChapterRef]) -> Self {
        let mut numbers = chapters.iter().map(|c| c.number);
        let Some(first) = numbers.next() else {
            return Self::DEGENERATE;
        };
        numbers.fold(
            ChapterRange {
                min: first,
                max: first,
            },
            |range, n| ChapterRange {
                min: range.min.min(n),
                max: range.max.max(n),
            },
        )
    }

    /// Returns true if `number` lies within the range (inclusive).
    pub fn contains(&self, number: f64) -> bool {
        self.min <= number && number <= self.max
    }
}

impl Default for ChapterRange {
    fn default() -> Self {
        Self::DEGENERATE
    }
}

/// Formats a chapter number without a trailing ".0".
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

/// Default label for a chapter without link text.
pub fn default_chapter_title(number: f64) -> String {
    format!("Chapter {}", format_number(number))
}

/// Drops repeated numbers (first occurrence wins) and sorts ascending.
pub fn dedupe_and_sort(chapters: Vec<ChapterRef>) -> Vec<ChapterRef> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ChapterRef> = chapters
        .into_iter()
        .filter(|c| seen.insert(c.number.to_bits()))
        .collect();
    unique.sort_by(|a, b| a.number.total_cmp(&b.number));
    unique
}

/// Full scrape result for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub status: SeriesStatus,
    #[serde(default)]
    pub kind: SeriesKind,
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Page the record was scraped from.
    pub source_url: String,
    /// Chapters sorted ascending by number, numbers unique.
    pub chapters: Vec<ChapterRef>,
    /// Detected chapter range, `{1, 1}` when no chapters were found.
    pub range: ChapterRange,
}

impl SeriesMetadata {
    /// Chapters ordered newest first, for reading lists.
    pub fn newest_first(&self) -> Vec<ChapterRef> {
        let mut chapters = self.chapters.clone();
        chapters.reverse();
        chapters
    }

    /// Highest chapter number, or 0 when there are none.
    pub fn last_chapter(&self) -> f64 {
        self.chapters.last().map(|c| c.number).unwrap_or(0.0)
    }
}
