//! Store trait consumed by the query service and the mutation gate.

use crate::{Book, BookId, BookPatch, Filter, SortKey, Window};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport or connection fault; the store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Other(String),
}

/// Outcome of `update_one`: how many records matched the identifier and
/// how many were actually changed. `matched == 1, modified == 0` means the
/// record exists but the patch was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

/// Uniform interface over the persistent book collection.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Sorted, windowed read of the records matching the filter.
    async fn find_many(
        &self,
        filter: &Filter,
        sort: SortKey,
        window: Window,
    ) -> Result<Vec<Book>, StoreError>;

    /// Unwindowed count of the records matching the filter.
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn find_one(&self, id: &BookId) -> Result<Option<Book>, StoreError>;

    /// Insert a record; returns its identifier.
    async fn insert_one(&self, book: Book) -> Result<BookId, StoreError>;

    /// Apply a field patch to the record with the given identifier.
    async fn update_one(&self, id: &BookId, patch: &BookPatch)
        -> Result<UpdateResult, StoreError>;

    /// Remove the record with the given identifier; returns the number of
    /// records removed (0 or 1). Deletion is permanent.
    async fn delete_one(&self, id: &BookId) -> Result<u64, StoreError>;
}
