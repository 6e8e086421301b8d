//! Outbound HTTP with browser-like headers.
//!
//! The [`Transport`] trait is the seam between the extraction code and the
//! network. [`HttpFetcher`] is the reqwest-backed implementation; it never
//! retries and reports upstream refusals separately from network errors.

use crate::config::ScrapingConfig;
use crate::error::ScraperError;
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER,
};
use std::time::Duration;
use url::Url;

/// Accept header a desktop browser sends for a page navigation.
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

/// Referer sent with first-hop page fetches.
pub const SEARCH_REFERER: &str = "https://www.google.com/";

/// Request method and payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Get,
    /// `application/x-www-form-urlencoded` POST.
    PostForm(Vec<(String, String)>),
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: Method,
    pub referer: Option<String>,
}

impl FetchRequest {
    /// Builds a GET request.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::Get,
            referer: None,
        }
    }

    /// Builds a form-encoded POST request.
    pub fn post_form(url: Url, pairs: &[(&str, &str)]) -> Self {
        let pairs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            url,
            method: Method::PostForm(pairs),
            referer: None,
        }
    }

    /// Sets the `Referer` header.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Value of the `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Anything that can execute a [`FetchRequest`].
///
/// Implementations must return `Err` for non-2xx responses so callers never
/// parse an error page as content.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ScraperError>;
}

/// Validates caller input as an absolute http(s) URL.
pub fn parse_url(raw: &str) -> Result<Url, ScraperError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScraperError::MissingUrl);
    }

    let url = Url::parse(raw).map_err(|e| ScraperError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ScraperError::InvalidUrl(format!(
            "{}: only http(s) URLs are supported",
            raw
        ))),
    }
}

/// Builds the shared reqwest client.
pub fn build_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_sec))
        .build()
}

/// Turns a non-2xx response into [`ScraperError::Blocked`].
pub fn check_response_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(ScraperError::Blocked {
        url: response.url().to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given configuration.
    pub fn new(config: &ScrapingConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// The underlying client, for streaming callers such as the image relay.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ScraperError> {
        tracing::debug!(url = %request.url, method = ?request.method, "fetching");

        let mut builder = match &request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::PostForm(pairs) => {
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                self.client
                    .post(request.url.clone())
                    .header(
                        CONTENT_TYPE,
                        "application/x-www-form-urlencoded; charset=UTF-8",
                    )
                    .header("X-Requested-With", "XMLHttpRequest")
                    .body(body)
            }
        };

        if let Some(referer) = &request.referer {
            builder = builder.header(REFERER, referer.as_str());
        }

        let response = check_response_status(builder.send().await?)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
