// HTTP API Server Implementation
// Metadata scraping and portfolio persistence routes for the website and admin console

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::LinkfolioConfig,
    contracts::PortfolioStore,
    editor::PortfolioEditor,
    error::LinkfolioError,
    fetcher::MetadataService,
    file_storage::create_file_store,
    http_types::{
        ApiError, BannerParams, EntryRequest, EntryResponse, HealthResponse,
        SCRAPE_FAILED_MESSAGE,
    },
    observability::{get_metrics, with_trace_id},
    types::{Collection, Portfolio, ScrapedMetadata},
};

// Global server start time for uptime tracking
static SERVER_START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PortfolioStore>,
    metadata: MetadataService,
    editor: Arc<PortfolioEditor>,
}

impl AppState {
    pub fn new(store: Arc<dyn PortfolioStore>, metadata: MetadataService) -> Self {
        let editor = Arc::new(PortfolioEditor::new(store.clone(), metadata.clone()));
        Self {
            store,
            metadata,
            editor,
        }
    }

    /// Build the production state: file-backed store plus a real HTTP scraper
    pub async fn from_config(config: &LinkfolioConfig) -> Result<Self> {
        let store = create_file_store(config.storage.data_file.clone()).await;
        let metadata = MetadataService::http(&config.scraper)?;
        Ok(Self::new(store, metadata))
    }

    pub fn store(&self) -> &Arc<dyn PortfolioStore> {
        &self.store
    }
}

/// Create HTTP server with all routes configured
pub fn create_server(state: AppState) -> Router {
    Lazy::force(&SERVER_START_TIME);

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/api/banner", get(scrape_banner))
        .route("/api/portfolio", get(get_portfolio).post(replace_portfolio))
        .route("/api/portfolio/:collection", post(add_entry))
        .route(
            "/api/portfolio/:collection/:id",
            put(edit_entry).delete(delete_entry),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve on an already-bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = create_server(state);
    if let Ok(addr) = listener.local_addr() {
        info!("Linkfolio HTTP server listening on {}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Bind `bind_address` and serve until interrupted
pub async fn start_server(state: AppState, bind_address: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: SERVER_START_TIME.elapsed().as_secs(),
    })
}

async fn get_stats() -> Json<serde_json::Value> {
    Json(get_metrics())
}

/// `GET /api/banner?url=...`
async fn scrape_banner(
    State(state): State<AppState>,
    Query(params): Query<BannerParams>,
) -> Result<Json<ScrapedMetadata>, ApiError> {
    let target = params
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing url parameter"))?;

    with_trace_id("scrape_banner", state.metadata.fetch_metadata(&target))
        .await
        .map(Json)
        .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, SCRAPE_FAILED_MESSAGE))
}

/// `GET /api/portfolio`
async fn get_portfolio(State(state): State<AppState>) -> Json<Portfolio> {
    Json(state.store.read())
}

/// `POST /api/portfolio` with a full Portfolio document
async fn replace_portfolio(State(state): State<AppState>, body: Bytes) -> (StatusCode, &'static str) {
    let parsed = std::str::from_utf8(&body)
        .map_err(|e| LinkfolioError::invalid_input("body", e.to_string()))
        .and_then(Portfolio::from_json);

    let portfolio = match parsed {
        Ok(portfolio) => portfolio,
        Err(e) => {
            warn!("Rejected portfolio payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };

    match with_trace_id("replace_portfolio", state.store.write(portfolio)).await {
        Ok(()) => {}
        // In-memory copy already updated; the durable copy catches up on the next write
        Err(e) => warn!("Portfolio accepted but not persisted: {}", e),
    }
    (StatusCode::OK, "ok")
}

fn parse_collection(raw: &str) -> Result<Collection, ApiError> {
    raw.parse::<Collection>().map_err(ApiError::from)
}

/// `POST /api/portfolio/:collection` with `{ "url": ... }`
async fn add_entry(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    let collection = parse_collection(&collection)?;
    let change = with_trace_id("add_entry", state.editor.add_entry(collection, &request.url)).await?;
    Ok((StatusCode::CREATED, Json(change.into())))
}

/// `PUT /api/portfolio/:collection/:id` with `{ "url": ... }`
async fn edit_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, i64)>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let collection = parse_collection(&collection)?;
    let change =
        with_trace_id("edit_entry", state.editor.edit_entry(collection, id, &request.url)).await?;
    Ok(Json(change.into()))
}

/// `DELETE /api/portfolio/:collection/:id`
async fn delete_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, i64)>,
) -> Result<Json<EntryResponse>, ApiError> {
    let collection = parse_collection(&collection)?;
    let change = with_trace_id("delete_entry", state.editor.delete_entry(collection, id)).await?;
    Ok(Json(change.into()))
}
