// Contracts for portfolio persistence
// Both store variants honour the same read / replace-all / subscribe contract
// and differ only in where the durable copy lives.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::Result;
use crate::types::Portfolio;

/// Capacity of the change channel; slow subscribers observe `Lagged`
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Core trait for portfolio persistence
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Current portfolio
    ///
    /// # Postconditions
    /// - Returns the seeded default when nothing valid has been stored
    /// - Does not modify any state
    fn read(&self) -> Portfolio;

    /// Replace the stored portfolio
    ///
    /// # Postconditions
    /// - A following `read` returns a value equal to `portfolio`
    /// - Subscribers receive the new value
    /// - Never merges with the previous value
    async fn write(&self, portfolio: Portfolio) -> Result<()>;

    /// Subscribe to values written after this call
    fn subscribe(&self) -> broadcast::Receiver<Portfolio>;

    /// Subscription as a `Stream`
    fn changes(&self) -> BroadcastStream<Portfolio> {
        BroadcastStream::new(self.subscribe())
    }
}

/// Publish side of a store's change notifications
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<Portfolio>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Portfolio> {
        self.tx.subscribe()
    }

    /// Send to current subscribers; having none is not an error
    pub fn publish(&self, portfolio: &Portfolio) {
        let _ = self.tx.send(portfolio.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let notifier = ChangeNotifier::new();
        notifier.publish(&Portfolio::default());

        // Late subscribers only see later values
        let mut late = notifier.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_values() {
        let notifier = ChangeNotifier::new();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        let mut portfolio = Portfolio::default();
        portfolio.shops.clear();
        notifier.publish(&portfolio);

        assert_eq!(first.recv().await.unwrap(), portfolio);
        assert_eq!(second.recv().await.unwrap(), portfolio);
    }
}
