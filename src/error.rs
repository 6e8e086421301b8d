//! Error types for manhwa-scout.
//!
//! Uses `thiserror` for structured error definitions. Only fetch-level
//! failures and caller input problems are errors; extraction anomalies are
//! absorbed by the fallback chains and never show up here.

use serde::Serialize;
use thiserror::Error;

/// Main error type for scraping, relay and import operations.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream returned {status} {reason} for {url}")]
    Blocked {
        url: String,
        status: u16,
        reason: String,
    },

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The caller did not supply a URL at all.
    #[error("URL is required")]
    MissingUrl,

    /// A chapter range whose start lies after its end.
    #[error("Invalid chapter range: {from} > {to}")]
    InvalidRange { from: u32, to: u32 },

    /// A chapter range spanning more chapters than an import may create.
    #[error("Chapter range {from}-{to} exceeds the limit of {max} chapters")]
    RangeTooLarge { from: u32, to: u32, max: u32 },

    /// The persistence collaborator rejected the record.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse failure classification, so a UI can tell "site blocked us" apart
/// from "bad URL".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Blocked,
    Network,
    InvalidInput,
    Conflict,
    Storage,
}

impl ScraperError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ScraperError::Http(_) => FailureKind::Network,
            ScraperError::Blocked { .. } => FailureKind::Blocked,
            ScraperError::InvalidUrl(_)
            | ScraperError::MissingUrl
            | ScraperError::InvalidRange { .. }
            | ScraperError::RangeTooLarge { .. } => FailureKind::InvalidInput,
            ScraperError::Store(StoreError::Conflict(_)) => FailureKind::Conflict,
            ScraperError::Store(_) => FailureKind::Storage,
        }
    }
}

/// Error type for the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or write the backing files
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to (de)serialize a stored record
    #[error("Failed to encode stored record: {0}")]
    Json(#[from] serde_json::Error),

    /// A series with the same identity already exists
    #[error("Series already exists: {0}")]
    Conflict(String),

    /// The referenced series is unknown to the store
    #[error("Series not found: {0}")]
    NotFound(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let blocked = ScraperError::Blocked {
            url: "https://example.com".to_string(),
            status: 403,
            reason: "Forbidden".to_string(),
        };
        assert_eq!(blocked.kind(), FailureKind::Blocked);
        assert_eq!(ScraperError::MissingUrl.kind(), FailureKind::InvalidInput);
        assert_eq!(
            ScraperError::InvalidRange { from: 9, to: 2 }.kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            ScraperError::RangeTooLarge { from: 0, to: u32::MAX, max: 2_000 }.kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            ScraperError::Store(StoreError::Conflict("x".to_string())).kind(),
            FailureKind::Conflict
        );
    }

    #[test]
    fn test_blocked_message_carries_status() {
        let err = ScraperError::Blocked {
            url: "https://example.com/a".to_string(),
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("https://example.com/a"));
    }
}
