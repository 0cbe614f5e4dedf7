//! Error types for search operations
//!
//! Defines the error taxonomy for the search engine with transience
//! classification used by the retry coordinator. A detected block is
//! deliberately *not* an error: it is returned as a normal
//! [`SearchAttempt`](crate::pagination::SearchAttempt) carrying a block
//! flag, so the caller can decide whether to escalate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Error types for search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Browser session launch failed; the pool resets and the next
    /// acquire re-initializes
    #[error("Failed to initialize browser session: {0}")]
    SessionInit(String),

    /// Browsing context creation failed (attempt-fatal, retried)
    #[error("Failed to create browsing context: {0}")]
    ContextCreation(String),

    /// Page navigation did not complete within the configured timeout
    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    /// Page navigation failed for another reason
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Query rejected before any browser work started
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// The overall search deadline (scaled by page count) elapsed
    #[error("Search timed out after {0:?}")]
    Timeout(Duration),

    /// All retry attempts were consumed without a successful outcome
    #[error("Search failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<SearchError>,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(error: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        SearchError::Other(format!("{error:#}"))
    }
}

impl SearchError {
    /// Check if a failed attempt with this error should be retried
    ///
    /// Context creation and navigation failures are usually transient
    /// (crashed tab, slow network). Query validation, the overall
    /// deadline, and exhaustion itself never warrant another attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::ContextCreation(_)
                | SearchError::NavigationTimeout(_)
                | SearchError::Navigation(_)
                | SearchError::Other(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SearchError::ContextCreation("boom".into()).is_transient());
        assert!(SearchError::NavigationTimeout(Duration::from_secs(30)).is_transient());
        assert!(!SearchError::InvalidQuery("empty".into()).is_transient());
        assert!(!SearchError::Timeout(Duration::from_secs(90)).is_transient());
    }

    #[test]
    fn test_exhausted_preserves_cause() {
        let err = SearchError::Exhausted {
            attempts: 3,
            source: Box::new(SearchError::Navigation("net::ERR_FAILED".into())),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("net::ERR_FAILED"));
        assert!(!err.is_transient());
    }
}
