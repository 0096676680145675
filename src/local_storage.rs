// Client-local Portfolio Store
// Transient per-process key/value storage holding the serialised portfolio
// under a fixed key, the way a browser keeps it in local storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::contracts::{ChangeNotifier, PortfolioStore};
use crate::error::{LinkfolioError, Result};
use crate::observability::{log_operation, Operation, OperationContext};
use crate::types::Portfolio;

/// Key under which the serialised portfolio is kept
pub const PORTFOLIO_STORAGE_KEY: &str = "linkfolio-portfolio";

#[derive(Default)]
pub struct LocalPortfolioStore {
    entries: RwLock<HashMap<String, String>>,
    notifier: ChangeNotifier,
}

impl LocalPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, if any
    pub fn raw(&self) -> Option<String> {
        self.entries.read().get(PORTFOLIO_STORAGE_KEY).cloned()
    }

    /// Overwrite the raw stored document without notifying subscribers
    pub fn set_raw(&self, value: impl Into<String>) {
        self.entries
            .write()
            .insert(PORTFOLIO_STORAGE_KEY.to_string(), value.into());
    }

    pub fn clear(&self) {
        self.entries.write().remove(PORTFOLIO_STORAGE_KEY);
    }
}

#[async_trait]
impl PortfolioStore for LocalPortfolioStore {
    fn read(&self) -> Portfolio {
        let Some(raw) = self.raw() else {
            return Portfolio::default();
        };
        match Portfolio::from_json(&raw) {
            Ok(portfolio) => portfolio.normalized(),
            Err(e) => {
                debug!("Stored portfolio rejected, using defaults: {}", e);
                Portfolio::default()
            }
        }
    }

    /// Normalises before storing, so subscribers and later reads see the same value
    async fn write(&self, portfolio: Portfolio) -> Result<()> {
        let portfolio = portfolio.normalized();
        let ctx = OperationContext::new("local_portfolio_write");
        let op = Operation::PortfolioWrite {
            shops: portfolio.shops.len(),
            services: portfolio.services.len(),
        };

        let result = serde_json::to_string(&portfolio)
            .map(|serialized| self.set_raw(serialized))
            .map_err(|e| LinkfolioError::PersistenceFailure {
                path: PORTFOLIO_STORAGE_KEY.to_string(),
                source: e.into(),
            });
        log_operation(&ctx, &op, &result);

        if result.is_ok() {
            self.notifier.publish(&portfolio);
        }
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<Portfolio> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PortfolioItem, DEFAULT_BANNER_URL};
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_empty_store_reads_default() {
        let store = LocalPortfolioStore::new();
        assert_eq!(store.read(), Portfolio::default());
        assert!(store.raw().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = LocalPortfolioStore::new();
        let mut portfolio = Portfolio::default();
        portfolio.shops.remove(0);

        store.write(portfolio.clone()).await.unwrap();
        assert_eq!(store.read(), portfolio);

        store.clear();
        assert!(store.raw().is_none());
        assert_eq!(store.read(), Portfolio::default());
    }

    #[tokio::test]
    async fn test_corrupt_or_misshapen_payload_reads_default() {
        let store = LocalPortfolioStore::new();
        for raw in ["not json", "[]", r#"{"shops": []}"#, r#"{"shops": [], "services": "x"}"#] {
            store.set_raw(raw);
            assert_eq!(store.read(), Portfolio::default(), "payload {raw}");
        }
    }

    #[tokio::test]
    async fn test_write_normalizes_so_every_observer_agrees() {
        let store = LocalPortfolioStore::new();
        let mut rx = store.subscribe();

        let mut portfolio = Portfolio::default();
        portfolio.shops[0].icon = None;
        portfolio.shops[0].banner_url = None;
        portfolio.services[1].icon = None;
        store.write(portfolio.clone()).await.unwrap();

        let read = store.read();
        assert_eq!(read.shops[0].icon.as_deref(), Some("SHOP"));
        assert_eq!(read.shops[0].banner_url.as_deref(), Some(DEFAULT_BANNER_URL));
        assert_eq!(read.services[1].icon.as_deref(), Some("SERVICE"));
        assert_eq!(read, portfolio.normalized());
        assert_eq!(rx.recv().await.unwrap(), read);
        assert_eq!(Portfolio::from_json(&store.raw().unwrap()).unwrap(), read);

        // Writing back what was read is a no-op round trip
        store.write(read.clone()).await.unwrap();
        assert_eq!(store.read(), read);
    }

    #[tokio::test]
    async fn test_read_normalizes_missing_fields() {
        let store = LocalPortfolioStore::new();
        store.set_raw(r#"{"shops":[{"id":5,"name":"Bare"}],"services":[]}"#);

        let item: PortfolioItem = store.read().shops.remove(0);
        assert_eq!(item.icon.as_deref(), Some("SHOP"));
        assert_eq!(item.banner_url.as_deref(), Some(DEFAULT_BANNER_URL));
    }

    #[tokio::test]
    async fn test_changes_stream_sees_each_write() {
        let store = LocalPortfolioStore::new();
        let mut changes = store.changes();

        let mut first = Portfolio::default();
        first.services.clear();
        let mut second = first.clone();
        second.shops.clear();

        store.write(first.clone()).await.unwrap();
        store.write(second.clone()).await.unwrap();

        assert_eq!(changes.next().await.unwrap().unwrap(), first);
        assert_eq!(changes.next().await.unwrap().unwrap(), second);
    }
}
