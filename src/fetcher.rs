// Metadata Fetch Service
// Retrieves a page over HTTP, runs the extractor and resolves the banner URL.
// Every call re-fetches; there is no cache and no retry.

use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::{LinkfolioError, Result};
use crate::extractor::extract;
use crate::observability::{log_operation, Operation, OperationContext};
use crate::resolver::resolve;
use crate::types::ScrapedMetadata;

/// Transport used to retrieve page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url`
    ///
    /// # Postconditions
    /// - Returns the body text for a success (2xx) status
    /// - Any transport failure or non-success status is `UpstreamFetchFailure`
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher sending a bot user-agent
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Build the client; failure here is a startup problem, not a scrape failure
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .context("Failed to build the scraper HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LinkfolioError::upstream(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkfolioError::upstream(
                url,
                format!("host page answered {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| LinkfolioError::upstream(url, e))
    }
}

/// Orchestrates fetch, extraction and banner resolution
#[derive(Clone)]
pub struct MetadataService {
    fetcher: Arc<dyn PageFetcher>,
}

impl MetadataService {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Build a service backed by a real HTTP client
    pub fn http(config: &ScraperConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(HttpPageFetcher::new(config)?)))
    }

    /// Fetch `target_url` and scrape its metadata
    ///
    /// Only the banner is URL-resolved; title and description are plain text.
    pub async fn fetch_metadata(&self, target_url: &str) -> Result<ScrapedMetadata> {
        let mut ctx = OperationContext::new("fetch_metadata");
        ctx.add_attribute("url", target_url);
        let op = Operation::Scrape {
            url: target_url.to_string(),
        };

        let outcome = self.fetcher.fetch_page(target_url).await;
        match outcome {
            Ok(html) => {
                debug!("Fetched {} bytes from {}", html.len(), target_url);
                let mut metadata = extract(&html);
                metadata.banner = resolve(&metadata.banner, target_url);
                log_operation(&ctx, &op, &Ok::<(), LinkfolioError>(()));
                Ok(metadata)
            }
            Err(e) => {
                log_operation(&ctx, &op, &Err::<(), _>(&e));
                Err(e)
            }
        }
    }
}
