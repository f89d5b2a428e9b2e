//! Error types for the `menu-search` crate.

use thiserror::Error;

use crate::lifecycle::SearchState;

/// Errors that can occur while building or querying the menu search index.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The catalog handed to initialization was missing or malformed.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// No catalog item could be embedded.
    #[error("Catalog produced no indexable items")]
    EmptyIndex,

    /// A search was attempted before the index reached the ready state.
    #[error("Search index is not ready (state: {state})")]
    NotReady {
        /// The lifecycle state at the time of the call.
        state: SearchState,
    },

    /// The nearest-neighbour index could not be constructed.
    ///
    /// Never surfaced to callers of [`MenuSearch`](crate::MenuSearch): the
    /// index factory logs it and switches to the fallback store.
    #[error("Vector index unavailable: {0}")]
    DegradedIndex(String),

    /// Reading or writing the durable store failed.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
