//! Image relay.
//!
//! Many image CDNs refuse hotlinked requests. The relay fetches the image
//! itself, presenting the image host's own origin as `Referer`, and hands the
//! bytes back with long-lived cache headers. Failures are reported, never
//! retried and never cached.

use crate::config::RelayConfig;
use crate::error::ScraperError;
use crate::fetcher::{check_response_status, parse_url};
use crate::normalize::origin_referer;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER};

const ACCEPT_IMAGE: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

/// An open upstream image response, ready to be streamed to a client.
#[derive(Debug)]
pub struct RelayStream {
    pub content_type: String,
    pub cache_control: String,
    pub response: reqwest::Response,
}

/// A fully buffered relayed image.
#[derive(Debug, Clone)]
pub struct RelayedImage {
    pub content_type: String,
    pub cache_control: String,
    pub bytes: Vec<u8>,
}

/// Referer-spoofing image fetcher.
#[derive(Debug, Clone)]
pub struct ImageRelay {
    client: reqwest::Client,
    cache_control: String,
    default_content_type: String,
}

impl ImageRelay {
    pub fn new(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            cache_control: format!("public, max-age={}", config.cache_max_age_sec),
            default_content_type: config.default_content_type.clone(),
        }
    }

    /// `Cache-Control` value attached to relayed images.
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// Issues the upstream request and returns the open response.
    pub async fn open(&self, raw_url: &str) -> Result<RelayStream, ScraperError> {
        let url = parse_url(raw_url)?;
        tracing::debug!(url = %url, "relaying image");

        let response = self
            .client
            .get(url.clone())
            .header(REFERER, origin_referer(&url))
            .header(ACCEPT, ACCEPT_IMAGE)
            .send()
            .await?;
        let response = check_response_status(response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.default_content_type.as_str())
            .to_string();

        Ok(RelayStream {
            content_type,
            cache_control: self.cache_control.clone(),
            response,
        })
    }

    /// Fetches the whole image into memory.
    pub async fn fetch(&self, raw_url: &str) -> Result<RelayedImage, ScraperError> {
        let RelayStream {
            content_type,
            cache_control,
            response,
        } = self.open(raw_url).await?;

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        Ok(RelayedImage {
            content_type,
            cache_control,
            bytes,
        })
    }
}
