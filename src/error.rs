//! Error types for the listing search engine.
//!
//! Structured errors using thiserror, with stable status codes and
//! actionable recovery suggestions so process-boundary adapters can map
//! failures to transport shapes without string matching.

use thiserror::Error;

use crate::vector::VectorError;

/// Errors from the backing listing store.
///
/// Store unavailability is fatal to a request: without the store the
/// engine can neither evaluate filters nor join results back to
/// listings. Adapters must surface it as a service-level error, distinct
/// from "no results found".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(
        "Listing store unavailable: {reason}\nSuggestion: Check that the store backend is running and reachable"
    )]
    Unavailable { reason: String },

    #[error("Listing {id} not found in store")]
    NotFound { id: crate::ListingId },
}

/// Main error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Embedding backend unreachable or timed out. The orchestrator
    /// recovers from this internally by degrading to filter-only search;
    /// callers only observe it through `SearchStatus::Degraded`.
    #[error(
        "Embedding encoder unavailable: {reason}\nSuggestion: Verify the embedding model is initialized and retry"
    )]
    EncodingUnavailable { reason: String },

    /// Empty or non-text query input. Mapped by the orchestrator to an
    /// empty-result outcome with an explanatory status, never an Err at
    /// the adapter boundary.
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vector(#[from] VectorError),
}

impl SearchError {
    /// Stable status code for JSON responses.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::EncodingUnavailable { .. } => "ENCODING_UNAVAILABLE",
            Self::InvalidQuery { .. } => "INVALID_QUERY",
            Self::Store(StoreError::Unavailable { .. }) => "STORE_UNAVAILABLE",
            Self::Store(StoreError::NotFound { .. }) => "LISTING_NOT_FOUND",
            Self::Vector(_) => "VECTOR_ERROR",
        }
    }

    /// Recovery suggestions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::EncodingUnavailable { .. } => vec![
                "The engine automatically falls back to filter-only search",
                "Check network access to the embedding model if this persists",
            ],
            Self::InvalidQuery { .. } => {
                vec!["Provide a non-empty free-text query, e.g. 'dwupokojowe mieszkanie w Gdańsku'"]
            }
            Self::Store(StoreError::Unavailable { .. }) => vec![
                "Verify the listing store is running",
                "Retry the request once the store is reachable",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for search operations.
pub type SearchOpResult<T> = Result<T, SearchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
