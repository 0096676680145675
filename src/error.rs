// Error taxonomy for Linkfolio
// Every fallible library operation returns one of these variants; the HTTP
// layer maps them onto status codes at the boundary.

use std::io;

/// Errors surfaced by the extractor, fetch service, stores and editor
#[derive(Debug, thiserror::Error)]
pub enum LinkfolioError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream page unreachable or answered with a non-success status.
    /// `reason` is for logs only and is never sent to HTTP callers.
    #[error("Failed to fetch {url}")]
    UpstreamFetchFailure { url: String, reason: String },

    #[error("Failed to persist portfolio to {path}")]
    PersistenceFailure {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl LinkfolioError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::UpstreamFetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller's request rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::NotFound(_))
    }
}

pub type Result<T, E = LinkfolioError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_hides_reason() {
        let err = LinkfolioError::upstream("https://acme.test", "dns error: no such host");
        assert_eq!(err.to_string(), "Failed to fetch https://acme.test");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(LinkfolioError::invalid_input("url", "empty").is_client_error());
        assert!(LinkfolioError::NotFound("shop 7".into()).is_client_error());

        let persist = LinkfolioError::PersistenceFailure {
            path: "/tmp/x.json".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!persist.is_client_error());
        assert!(std::error::Error::source(&persist).is_some());
    }
}
