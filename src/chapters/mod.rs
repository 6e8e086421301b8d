//! Chapter discovery: finding, numbering and ordering the chapters of a series.

pub mod dates;
pub mod discovery;
pub mod rules;
pub mod synthetic;

pub use dates::parse_release_date;
pub use discovery::{Discovery, DiscoveryPlan, DiscoveryStrategy, discover, number_links};
pub use rules::{NUMBER_RULES, NumberRule, RuleInput, extract_number};
pub use synthetic::{MAX_SYNTHETIC_CHAPTERS, chapter_url_pattern, check_range, synthesize_range};

/// A candidate chapter anchor, already resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterLink {
    pub href: String,
    /// Anchor text, whitespace collapsed.
    pub text: String,
    /// The anchor sits inside a chapter-list item.
    pub in_list: bool,
    /// Raw release-date text found next to the anchor.
    pub released: Option<String>,
}
