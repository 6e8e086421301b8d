//! manhwa-scout - scraping and chapter detection for manga/manhwa sites.
//!
//! This library provides:
//! - Series metadata extraction with ordered fallback chains (Madara theme,
//!   Open Graph, plain HTML)
//! - Chapter discovery through the Madara AJAX endpoint or static page links
//! - Normalization into a canonical [`SeriesMetadata`] record
//! - An image relay, chapter page scraping and homepage catalogs
//! - Preview/import into an injected [`SeriesStore`], plus an axum server

pub mod catalog;
pub mod chapters;
pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod import;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod reader;
pub mod relay;
pub mod series;
pub mod server;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use chapters::{Discovery, DiscoveryStrategy, synthesize_range};
pub use config::Config;
pub use console::Console;
pub use error::{ConfigError, FailureKind, ScraperError, StoreError};
pub use fetcher::{HttpFetcher, Transport};
pub use import::{ImportOutcome, ImportRequest, ImportService};
pub use model::{ChapterRange, ChapterRef, SeriesKind, SeriesMetadata, SeriesStatus};
pub use normalize::Normalizer;
pub use relay::ImageRelay;
pub use series::{ChapterDetection, SeriesScraper};
pub use store::{JsonDirStore, SeriesStore};
