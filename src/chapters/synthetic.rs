//! Chapter lists built from a numeric range instead of a page.

use crate::error::ScraperError;
use crate::fetcher::parse_url;
use crate::model::{ChapterRef, default_chapter_title};
use crate::normalize::chapter_url;
use chrono::Utc;

/// Hard ceiling on the chapters one synthetic range may hold.
pub const MAX_SYNTHETIC_CHAPTERS: u32 = 10_000;

/// Rejects `from > to` and ranges holding more than `max` chapters.
pub fn check_range(from: u32, to: u32, max: u32) -> Result<(), ScraperError> {
    if from > to {
        return Err(ScraperError::InvalidRange { from, to });
    }
    if u64::from(to) - u64::from(from) + 1 > u64::from(max) {
        return Err(ScraperError::RangeTooLarge { from, to, max });
    }
    Ok(())
}

/// Builds chapters `from..=to` under `base_url`, each at `{base}/chapter-{n}/`.
pub fn synthesize_range(base_url: &str, from: u32, to: u32) -> Result<Vec<ChapterRef>, ScraperError> {
    parse_url(base_url)?;
    check_range(from, to, MAX_SYNTHETIC_CHAPTERS)?;

    let base_url = base_url.trim();
    let now = Utc::now();
    Ok((from..=to)
        .map(|n| ChapterRef {
            number: f64::from(n),
            title: default_chapter_title(f64::from(n)),
            content_url: chapter_url(base_url, n),
            released_at: now,
            inferred: false,
        })
        .collect())
}

/// Example chapter URL shown in detection reports.
pub fn chapter_url_pattern(base_url: &str) -> String {
    chapter_url(base_url.trim(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_five_to_eight() {
        let chapters = synthesize_range("https://example.com/series-x", 5, 8).unwrap();
        assert_eq!(chapters.len(), 4);

        let urls: Vec<&str> = chapters.iter().map(|c| c.content_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/series-x/chapter-5/",
                "https://example.com/series-x/chapter-6/",
                "https://example.com/series-x/chapter-7/",
                "https://example.com/series-x/chapter-8/",
            ]
        );
        assert_eq!(chapters[0].title, "Chapter 5");
        assert_eq!(chapters[3].title, "Chapter 8");
        assert!(chapters.iter().all(|c| !c.inferred));
    }

    #[test]
    fn test_trailing_slash_base() {
        let chapters = synthesize_range("https://example.com/series-x/", 1, 1).unwrap();
        assert_eq!(chapters[0].content_url, "https://example.com/series-x/chapter-1/");
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            synthesize_range("https://example.com/series-x", 9, 3),
            Err(ScraperError::InvalidRange { from: 9, to: 3 })
        ));
    }

    #[test]
    fn test_oversized_range_rejected() {
        assert!(matches!(
            synthesize_range("https://example.com/series-x", 0, u32::MAX),
            Err(ScraperError::RangeTooLarge { from: 0, to: u32::MAX, max: MAX_SYNTHETIC_CHAPTERS })
        ));
        assert!(matches!(
            synthesize_range("https://example.com/series-x", 0, 3_000_000),
            Err(ScraperError::RangeTooLarge { .. })
        ));

        let chapters =
            synthesize_range("https://example.com/series-x", 1, MAX_SYNTHETIC_CHAPTERS).unwrap();
        assert_eq!(chapters.len(), MAX_SYNTHETIC_CHAPTERS as usize);
    }

    #[test]
    fn test_check_range_limit() {
        assert!(check_range(1, 50, 50).is_ok());
        assert!(matches!(
            check_range(1, 51, 50),
            Err(ScraperError::RangeTooLarge { from: 1, to: 51, max: 50 })
        ));
        assert!(matches!(check_range(3, 2, 50), Err(ScraperError::InvalidRange { .. })));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        assert!(matches!(
            synthesize_range("", 1, 2),
            Err(ScraperError::MissingUrl)
        ));
        assert!(matches!(
            synthesize_range("example.com/series-x", 1, 2),
            Err(ScraperError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_pattern() {
        assert_eq!(
            chapter_url_pattern("https://example.com/series-x/"),
            "https://example.com/series-x/chapter-1/"
        );
    }
}
