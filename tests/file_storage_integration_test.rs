// File Storage Integration Tests
// Durable portfolio file behaviour across store instances sharing one path.

use anyhow::Result;
use linkfolio::{FilePortfolioStore, Portfolio, PortfolioStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn portfolio_named(name: &str) -> Portfolio {
    let mut portfolio = Portfolio::default();
    portfolio.shops[0].name = name.to_string();
    portfolio
}

#[tokio::test]
async fn test_reopen_sees_last_successful_write() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("portfolio.json");

    let store = FilePortfolioStore::open(&path).await;
    store.write(portfolio_named("First")).await?;
    store.write(portfolio_named("Second")).await?;
    drop(store);

    let reopened = FilePortfolioStore::open(&path).await;
    assert_eq!(reopened.read(), portfolio_named("Second"));
    Ok(())
}

#[tokio::test]
async fn test_last_writer_wins_across_instances() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("portfolio.json");

    let first = FilePortfolioStore::open(&path).await;
    let second = FilePortfolioStore::open(&path).await;

    first.write(portfolio_named("From first")).await?;
    second.write(portfolio_named("From second")).await?;

    // Each process keeps its own authoritative copy; the file holds the last write
    assert_eq!(first.read(), portfolio_named("From first"));
    let fresh = FilePortfolioStore::open(&path).await;
    assert_eq!(fresh.read(), portfolio_named("From second"));
    Ok(())
}

#[tokio::test]
async fn test_writes_replace_rather_than_merge() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FilePortfolioStore::open(dir.path().join("portfolio.json")).await;

    let empty = Portfolio {
        shops: Vec::new(),
        services: Vec::new(),
    };
    store.write(empty.clone()).await?;
    assert_eq!(store.read(), empty);

    let on_disk = std::fs::read_to_string(store.path())?;
    assert_eq!(Portfolio::from_json(&on_disk)?, empty);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_items_fall_back_to_default() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("portfolio.json");
    std::fs::write(&path, r#"{"shops": [{"name": "no id"}], "services": []}"#)?;

    let store = FilePortfolioStore::open(&path).await;
    assert_eq!(store.read(), Portfolio::default());
    Ok(())
}
