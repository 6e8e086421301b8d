//! Configuration management for manhwa-scout.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::chapters::MAX_SYNTHETIC_CHAPTERS;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "ManhwaScout";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Desktop Chrome user agent; many hosts answer 403 without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound fetch settings.
    pub scraping: ScrapingConfig,

    /// Preview/import behavior.
    pub import: ImportConfig,

    /// Image relay settings.
    pub relay: RelayConfig,

    /// Per-site tables.
    pub sources: SourcesConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// Web scraping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Hard timeout for a single outbound request.
    pub timeout_sec: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Enable scraper debug logging.
    pub debug: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            timeout_sec: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            debug: false,
        }
    }
}

/// Preview and import configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Pause between series during a batch import, in milliseconds.
    pub batch_delay_ms: u64,
    /// Default number of catalog entries processed per batch.
    pub batch_limit: usize,
    /// Characters of description kept in a preview.
    pub preview_description_chars: usize,
    /// Most chapters a single synthetic range import may create.
    pub max_range_chapters: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_delay_ms: 500,
            batch_limit: 50,
            preview_description_chars: 200,
            max_range_chapters: 2_000,
        }
    }
}

/// Image relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Route the relay is served on; third-party image URLs are rewritten to it.
    pub route: String,
    /// Rewrite thumbnails and page images through the relay.
    pub rewrite_images: bool,
    /// Client cache lifetime for relayed images, in seconds.
    pub cache_max_age_sec: u64,
    /// Content type used when upstream sends none.
    pub default_content_type: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            route: "/api/proxy".to_string(),
            rewrite_images: true,
            cache_max_age_sec: 86_400,
            default_content_type: "image/jpeg".to_string(),
        }
    }
}

/// Site-specific tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Site names stripped from the end of titles (" - Name" / " | Name").
    pub title_suffixes: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            title_suffixes: vec![
                "Asura Scans".to_string(),
                "Manhwa-Raw".to_string(),
                "Manhwaraw".to_string(),
            ],
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for the JSON series store.
    /// Defaults to `<config_dir>/library` when unset.
    pub store_directory: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraping.timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scraping.timeout_sec".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.scraping.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scraping.user_agent".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.import.max_range_chapters == 0
            || self.import.max_range_chapters > MAX_SYNTHETIC_CHAPTERS
        {
            return Err(ConfigError::InvalidValue {
                key: "import.max_range_chapters".to_string(),
                message: format!("must be between 1 and {}", MAX_SYNTHETIC_CHAPTERS),
            });
        }

        if !self.relay.route.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "relay.route".to_string(),
                message: "must be an absolute path starting with '/'".to_string(),
            });
        }

        if self.server.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: "server.addr".to_string(),
                message: format!("'{}' is not a socket address", self.server.addr),
            });
        }

        if self
            .sources
            .title_suffixes
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                key: "sources.title_suffixes".to_string(),
                message: "entries must not be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the effective store directory, using config or default.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.paths.store_directory {
            Ok(dir.clone())
        } else {
            Ok(Self::config_dir()?.join("library"))
        }
    }
}
