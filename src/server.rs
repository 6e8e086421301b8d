//! HTTP surface.
//!
//! Thin axum handlers over the library: every route parses its input, calls
//! one operation and maps [`ScraperError`] to a status code with a JSON body
//! of the form `{"error": "...", "kind": "..."}`.

use crate::catalog::{CatalogEntry, scrape_catalog};
use crate::config::Config;
use crate::error::{FailureKind, ScraperError};
use crate::fetcher::Transport;
use crate::import::{ImportOutcome, ImportRequest, ImportService};
use crate::model::SeriesMetadata;
use crate::normalize::{Normalizer, RelayRewriter};
use crate::reader::{ChapterPages, scrape_chapter_pages};
use crate::relay::ImageRelay;
use crate::series::{ChapterDetection, SeriesScraper};
use crate::store::SeriesStore;
use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<SeriesScraper>,
    pub importer: Arc<ImportService>,
    pub relay: Arc<ImageRelay>,
    pub rewriter: Option<RelayRewriter>,
    pub relay_route: String,
}

impl AppState {
    /// Wires the pipeline from configuration and injected collaborators.
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        client: reqwest::Client,
        store: Arc<dyn SeriesStore>,
    ) -> Self {
        let normalizer = Normalizer::new(&config.sources, &config.relay);
        let rewriter = normalizer.relay().cloned();
        let scraper = Arc::new(SeriesScraper::new(transport, normalizer));
        let importer = Arc::new(ImportService::new(
            Arc::clone(&scraper),
            store,
            config.import.clone(),
        ));

        Self {
            scraper,
            importer,
            relay: Arc::new(ImageRelay::new(client, &config.relay)),
            rewriter,
            relay_route: config.relay.route.clone(),
        }
    }
}

/// A failed request.
#[derive(Debug)]
pub struct ApiError(pub ScraperError);

impl From<ScraperError> for ApiError {
    fn from(err: ScraperError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: FailureKind,
}

fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
        FailureKind::Blocked | FailureKind::Network => StatusCode::BAD_GATEWAY,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, ?kind, "request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlInput {
    url: String,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    total: usize,
    entries: Vec<CatalogEntry>,
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    let relay_route = state.relay_route.clone();
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/scrape", post(scrape_handler))
        .route("/api/detect-chapters", post(detect_handler))
        .route("/api/bot/import", post(import_handler))
        .route("/api/scrape-chapter", get(chapter_pages_handler))
        .route("/api/catalog", get(catalog_handler))
        .route(&relay_route, get(proxy_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", addr))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(input): Json<UrlInput>,
) -> Result<Json<SeriesMetadata>, ApiError> {
    Ok(Json(state.scraper.scrape(&input.url).await?))
}

async fn detect_handler(
    State(state): State<AppState>,
    Json(input): Json<UrlInput>,
) -> Result<Json<ChapterDetection>, ApiError> {
    Ok(Json(state.scraper.detect(&input.url).await?))
}

async fn import_handler(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportOutcome>, ApiError> {
    Ok(Json(state.importer.handle(request).await?))
}

async fn chapter_pages_handler(
    State(state): State<AppState>,
    Query(input): Query<UrlInput>,
) -> Result<Json<ChapterPages>, ApiError> {
    let pages = scrape_chapter_pages(
        state.scraper.transport(),
        &input.url,
        state.rewriter.as_ref(),
    )
    .await?;
    Ok(Json(pages))
}

async fn catalog_handler(
    State(state): State<AppState>,
    Query(input): Query<UrlInput>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let entries = scrape_catalog(state.scraper.transport(), &input.url).await?;
    Ok(Json(CatalogResponse {
        total: entries.len(),
        entries,
    }))
}

async fn proxy_handler(
    State(state): State<AppState>,
    Query(input): Query<UrlInput>,
) -> Result<Response, ApiError> {
    let upstream = state.relay.open(&input.url).await?;

    let mut resp = Response::new(Body::from_stream(upstream.response.bytes_stream()));
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&upstream.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&upstream.cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("no-store")),
    );
    Ok(resp)
}
