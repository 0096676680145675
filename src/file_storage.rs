// File-backed Portfolio Store
// Server-side variant: an in-memory copy that is authoritative for the life of
// the process, mirrored to a single pretty-printed JSON document on disk.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::contracts::{ChangeNotifier, PortfolioStore};
use crate::error::{LinkfolioError, Result};
use crate::observability::{log_operation, Operation, OperationContext};
use crate::types::Portfolio;

/// Portfolio store persisted to a JSON file
///
/// A failed file write is reported to the caller but never rolls back the
/// in-memory value, so the durable copy may lag behind until the next
/// successful write.
pub struct FilePortfolioStore {
    path: PathBuf,
    current: RwLock<Portfolio>,
    notifier: ChangeNotifier,
    /// Held across update, publish and persist so the file matches the last write
    write_lock: Mutex<()>,
}

impl FilePortfolioStore {
    /// Open the store at `path`
    ///
    /// A missing or corrupt file is not an error: the store starts from the
    /// seeded default portfolio and the file is rewritten on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = Self::load(&path).await.unwrap_or_default();
        Self {
            path,
            current: RwLock::new(initial),
            notifier: ChangeNotifier::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Option<Portfolio> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No portfolio file at {}, using defaults", path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read portfolio file {}: {}", path.display(), e);
                return None;
            }
        };

        match Portfolio::from_json(&content) {
            Ok(portfolio) => {
                info!(
                    "Loaded portfolio from {} ({} shops, {} services)",
                    path.display(),
                    portfolio.shops.len(),
                    portfolio.services.len()
                );
                Some(portfolio)
            }
            Err(e) => {
                warn!(
                    "Ignoring corrupt portfolio file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write the durable copy through a temp file so readers never see half a document
    async fn persist(&self, portfolio: &Portfolio) -> io::Result<()> {
        let content = serde_json::to_string_pretty(portfolio)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, content.as_bytes()))
            .await
            .map_err(io::Error::other)?
    }
}

/// Atomically replace `path` with `content` via a uniquely named sibling temp file
fn replace_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    // On failure the temp file is dropped and removed
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl PortfolioStore for FilePortfolioStore {
    fn read(&self) -> Portfolio {
        self.current.read().clone()
    }

    async fn write(&self, portfolio: Portfolio) -> Result<()> {
        let mut ctx = OperationContext::new("portfolio_write");
        ctx.add_attribute("path", self.path.display().to_string());
        let op = Operation::PortfolioWrite {
            shops: portfolio.shops.len(),
            services: portfolio.services.len(),
        };

        let _serial = self.write_lock.lock().await;
        *self.current.write() = portfolio.clone();
        self.notifier.publish(&portfolio);

        let result = self
            .persist(&portfolio)
            .await
            .map_err(|source| LinkfolioError::PersistenceFailure {
                path: self.path.display().to_string(),
                source,
            });
        log_operation(&ctx, &op, &result);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<Portfolio> {
        self.notifier.subscribe()
    }
}

/// Open a file-backed store ready to be shared between request handlers
pub async fn create_file_store(path: impl Into<PathBuf>) -> Arc<FilePortfolioStore> {
    Arc::new(FilePortfolioStore::open(path).await)
}
