//! In-memory book store (process lifetime only).

use catalog_types::{
    Book, BookId, BookPatch, BookStore, Filter, SortKey, StoreError, UpdateResult, Window,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of `BookStore`. Default backend when no
/// database path is configured, and the store used by tests.
pub struct InMemoryBookStore {
    books: Arc<RwLock<HashMap<BookId, Book>>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self {
            books: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_many(
        &self,
        filter: &Filter,
        sort: SortKey,
        window: Window,
    ) -> Result<Vec<Book>, StoreError> {
        let guard = self.books.read().await;
        let mut matched: Vec<Book> = guard.values().filter(|b| filter.matches(b)).cloned().collect();
        drop(guard);
        matched.sort_by(|a, b| sort.compare(a, b));
        Ok(matched
            .into_iter()
            .skip(window.skip as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let guard = self.books.read().await;
        Ok(guard.values().filter(|b| filter.matches(b)).count() as u64)
    }

    async fn find_one(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn insert_one(&self, book: Book) -> Result<BookId, StoreError> {
        let id = book.id;
        self.books.write().await.insert(id, book);
        Ok(id)
    }

    async fn update_one(
        &self,
        id: &BookId,
        patch: &BookPatch,
    ) -> Result<UpdateResult, StoreError> {
        let mut guard = self.books.write().await;
        match guard.get_mut(id) {
            None => Ok(UpdateResult {
                matched: 0,
                modified: 0,
            }),
            Some(book) => {
                let mut updated = book.clone();
                patch.apply_to(&mut updated);
                if updated == *book {
                    Ok(UpdateResult {
                        matched: 1,
                        modified: 0,
                    })
                } else {
                    *book = updated;
                    Ok(UpdateResult {
                        matched: 1,
                        modified: 1,
                    })
                }
            }
        }
    }

    async fn delete_one(&self, id: &BookId) -> Result<u64, StoreError> {
        Ok(if self.books.write().await.remove(id).is_some() {
            1
        } else {
            0
        })
    }
}
