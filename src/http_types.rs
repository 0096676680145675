//! Shared HTTP request and response types for the Linkfolio API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::editor::EntryChange;
use crate::error::LinkfolioError;

/// Message returned when a target page cannot be scraped
pub const SCRAPE_FAILED_MESSAGE: &str = "Unable to scrape metadata from the target page.";

/// Standard error body: `{ "error": "..." }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// An error body paired with its status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Map library errors for the admin endpoints; upstream detail is never leaked
impl From<LinkfolioError> for ApiError {
    fn from(err: LinkfolioError) -> Self {
        match err {
            LinkfolioError::InvalidInput { reason, .. } => Self::bad_request(reason),
            LinkfolioError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            LinkfolioError::UpstreamFetchFailure { url, reason } => {
                warn!("Scrape of {} failed: {}", url, reason);
                Self::new(StatusCode::BAD_GATEWAY, SCRAPE_FAILED_MESSAGE)
            }
            LinkfolioError::PersistenceFailure { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to save the portfolio.",
            ),
        }
    }
}

/// Query parameters for `GET /api/banner`
#[derive(Debug, Deserialize)]
pub struct BannerParams {
    pub url: Option<String>,
}

/// Body for adding or re-scraping an entry
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub url: String,
}

/// Response for add / edit / delete
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub item: crate::types::PortfolioItem,
    pub message: String,
}

impl From<EntryChange> for EntryResponse {
    fn from(change: EntryChange) -> Self {
        Self {
            item: change.item,
            message: change.message,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
