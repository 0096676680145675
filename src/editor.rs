// Portfolio Editor
// The admin add / edit / delete flow: scrape metadata for a URL, merge it into
// an entry and persist the whole portfolio as a full replacement.
//
// Flow per mutation: idle -> fetching -> idle. A failed fetch leaves the
// portfolio untouched; there is no partial update and no rollback step.

use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use url::Url;

use crate::contracts::PortfolioStore;
use crate::error::{LinkfolioError, Result};
use crate::fetcher::MetadataService;
use crate::observability::{log_operation, Operation, OperationContext};
use crate::types::{Collection, Portfolio, PortfolioItem};

const UPDATED_DESCRIPTION: &str = "Updated entry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    Idle,
    Fetching,
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryChange {
    pub item: PortfolioItem,
    pub message: String,
}

/// Resets the editor to idle however the fetch ends, including cancellation
struct FetchingGuard<'a>(&'a SyncMutex<EditorState>);

impl<'a> FetchingGuard<'a> {
    fn enter(state: &'a SyncMutex<EditorState>) -> Self {
        *state.lock() = EditorState::Fetching;
        Self(state)
    }
}

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = EditorState::Idle;
    }
}

pub struct PortfolioEditor {
    store: Arc<dyn PortfolioStore>,
    metadata: MetadataService,
    /// Serialises read-modify-write sequences within the process
    mutation: Mutex<()>,
    state: SyncMutex<EditorState>,
}

impl PortfolioEditor {
    pub fn new(store: Arc<dyn PortfolioStore>, metadata: MetadataService) -> Self {
        Self {
            store,
            metadata,
            mutation: Mutex::new(()),
            state: SyncMutex::new(EditorState::Idle),
        }
    }

    pub fn state(&self) -> EditorState {
        *self.state.lock()
    }

    /// Scrape `url` and append a new entry to `collection`
    pub async fn add_entry(&self, collection: Collection, url: &str) -> Result<EntryChange> {
        let url = require_url(url)?;
        let _serial = self.mutation.lock().await;

        let metadata = {
            let _fetching = FetchingGuard::enter(&self.state);
            self.metadata.fetch_metadata(url).await?
        };

        let mut portfolio = self.store.read();
        let items = portfolio.items_mut(collection);
        let item = PortfolioItem {
            id: next_id(items)?,
            name: non_empty_or(metadata.title, || name_from_url(url)),
            description: non_empty_or(metadata.description, || {
                collection.default_description().to_string()
            }),
            icon: Some(collection.default_icon().to_string()),
            url: url.to_string(),
            banner_url: Some(metadata.banner),
        };
        items.push(item.clone());

        self.commit(portfolio).await?;
        self.log_change(Operation::EntryAdded {
            collection: collection.to_string(),
            id: item.id,
        });

        let message = format!("{} \"{}\" added.", collection.label(), item.name);
        Ok(EntryChange { item, message })
    }

    /// Re-scrape an entry from a possibly changed `url`
    ///
    /// If the fetch fails the entry is left exactly as it was, url included.
    pub async fn edit_entry(
        &self,
        collection: Collection,
        id: i64,
        url: &str,
    ) -> Result<EntryChange> {
        let url = require_url(url)?;
        let _serial = self.mutation.lock().await;

        if !self.store.read().items(collection).iter().any(|item| item.id == id) {
            return Err(not_found(collection, id));
        }

        let metadata = {
            let _fetching = FetchingGuard::enter(&self.state);
            self.metadata.fetch_metadata(url).await?
        };

        let mut portfolio = self.store.read();
        let item = portfolio
            .items_mut(collection)
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(collection, id))?;

        let previous_description = std::mem::take(&mut item.description);
        item.url = url.to_string();
        item.name = non_empty_or(metadata.title, || name_from_url(url));
        item.description = non_empty_or(metadata.description, || {
            non_empty_or(previous_description, || UPDATED_DESCRIPTION.to_string())
        });
        item.banner_url = Some(metadata.banner);
        let item = item.clone();

        self.commit(portfolio).await?;
        self.log_change(Operation::EntryUpdated {
            collection: collection.to_string(),
            id,
        });

        let message = format!("{} updated.", collection.label());
        Ok(EntryChange { item, message })
    }

    /// Remove an entry
    pub async fn delete_entry(&self, collection: Collection, id: i64) -> Result<EntryChange> {
        let _serial = self.mutation.lock().await;

        let mut portfolio = self.store.read();
        let items = portfolio.items_mut(collection);
        let position = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| not_found(collection, id))?;
        let item = items.remove(position);

        self.commit(portfolio).await?;
        self.log_change(Operation::EntryRemoved {
            collection: collection.to_string(),
            id,
        });

        let message = format!("{} removed.", collection.label());
        Ok(EntryChange { item, message })
    }

    /// Persist a full replacement; durable-copy failures are logged, not surfaced
    async fn commit(&self, portfolio: Portfolio) -> Result<()> {
        match self.store.write(portfolio).await {
            Ok(()) => Ok(()),
            Err(e @ LinkfolioError::PersistenceFailure { .. }) => {
                warn!("Portfolio kept in memory only: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn log_change(&self, op: Operation) {
        let ctx = OperationContext::new("portfolio_edit");
        log_operation(&ctx, &op, &Ok::<(), LinkfolioError>(()));
    }
}

fn require_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LinkfolioError::invalid_input(
            "url",
            "Provide a URL for this entry.",
        ));
    }
    Ok(url)
}

fn not_found(collection: Collection, id: i64) -> LinkfolioError {
    LinkfolioError::NotFound(format!("{} {} does not exist", collection.label(), id))
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

/// Host name without a leading `www.`, or the input when it is not a URL
pub fn name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_else(|| url.to_string())
}

/// Creation-time id, bumped past existing ids so it stays unique and increasing
fn next_id(items: &[PortfolioItem]) -> Result<i64> {
    let now = Utc::now().timestamp_millis();
    match items.iter().map(|item| item.id).max() {
        Some(max) if max >= now => max.checked_add(1).ok_or_else(|| {
            LinkfolioError::invalid_input("id", "no id is left above the largest existing id")
        }),
        _ => Ok(now),
    }
}
