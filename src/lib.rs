// Linkfolio - portfolio link curation with Open Graph metadata scraping
// Root library module

pub mod config;
pub mod contracts;
pub mod editor;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod file_storage;
pub mod http_server;
pub mod http_types;
pub mod local_storage;
pub mod observability;
pub mod resolver;
pub mod types;

// Re-export key types
pub use observability::{
    get_metrics, init_logging, init_logging_with_level, log_operation, with_trace_id, Operation,
    OperationContext,
};

pub use contracts::{ChangeNotifier, PortfolioStore};
pub use error::{LinkfolioError, Result};
pub use types::{Collection, Portfolio, PortfolioItem, ScrapedMetadata, DEFAULT_BANNER_URL};

// Re-export the scraping pipeline
pub use extractor::extract;
pub use fetcher::{HttpPageFetcher, MetadataService, PageFetcher};
pub use resolver::resolve;

// Re-export storage implementations
pub use file_storage::{create_file_store, FilePortfolioStore};
pub use local_storage::{LocalPortfolioStore, PORTFOLIO_STORAGE_KEY};

pub use config::LinkfolioConfig;
pub use editor::{EditorState, EntryChange, PortfolioEditor};
pub use http_server::{create_server, serve, start_server, AppState};
