//! Error taxonomy shared across the query and mutation paths.
//!
//! "Not found" is deliberately absent: a zero-matching identifier is a
//! zero-effect outcome, not an error.

use crate::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Structural invariant violated on input; detected before any store
    /// mutation is attempted.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Malformed record identifier; detected before any store call.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The store could not be reached. Distinct from an empty result page,
    /// which is a successful outcome.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => CatalogError::StoreUnavailable(msg),
            StoreError::Other(msg) => CatalogError::Store(msg),
        }
    }
}
