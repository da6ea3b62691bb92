//! Executes built query plans against the store.

use crate::QueryPlan;
use catalog_types::{Book, BookId, BookStore, CatalogError, Page};
use std::sync::Arc;

/// Read path over the book collection. Holds the store handle injected by
/// the composition root; no hidden process-global connection.
pub struct CatalogQueryService {
    store: Arc<dyn BookStore>,
}

impl CatalogQueryService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Run the windowed page read and the unwindowed count as two separate
    /// store reads. Against a changing store the count may be answered as
    /// of a slightly different instant than the page; that weak consistency
    /// is accepted. An empty page is a success; a store fault is not.
    pub async fn query(&self, plan: &QueryPlan) -> Result<Page, CatalogError> {
        tracing::debug!(
            sort = ?plan.sort,
            skip = plan.window.skip,
            limit = plan.window.limit,
            "querying books"
        );
        let books = self
            .store
            .find_many(&plan.filter, plan.sort, plan.window)
            .await?;
        let total_count = self.store.count(&plan.filter).await?;
        Ok(Page { books, total_count })
    }

    pub async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, CatalogError> {
        Ok(self.store.find_one(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use catalog_store::InMemoryBookStore;
    use catalog_types::{
        BookPatch, Filter, Genre, ListParams, SortKey, StoreError, UpdateResult, Window,
    };

    fn book(title: &str, author: &str, genre: Genre, price: f64, year: i32) -> Book {
        Book {
            id: BookId::new(),
            isbn: "978-0-00-000000-0".to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre,
            publication_year: year,
            price,
            description: format!("About {}", title),
            image: None,
        }
    }

    async fn seeded_service() -> CatalogQueryService {
        let store = InMemoryBookStore::new();
        for b in [
            book("A", "Adams", Genre::Fiction, 10.00, 2000),
            book("B", "Brown", Genre::Mystery, 20.00, 2010),
            book("C", "Clark", Genre::Fiction, 30.00, 1990),
        ] {
            store.insert_one(b).await.unwrap();
        }
        CatalogQueryService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn page_and_count_cover_the_match_set() {
        let service = seeded_service().await;
        let mut params = ListParams::default();
        params.page_size = Some("2".to_string());
        let plan = builder::build(&params, None);

        let page = service.query(&plan).await.unwrap();
        assert_eq!(page.books.len(), 2);
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn second_page_of_size_one_is_second_in_sort_order() {
        let service = seeded_service().await;
        let mut params = ListParams::default();
        params.page_size = Some("1".to_string());
        params.page_number = Some("2".to_string());
        let plan = builder::build(&params, None);

        let page = service.query(&plan).await.unwrap();
        assert_eq!(page.books.len(), 1);
        assert_eq!(page.books[0].author, "Brown");
    }

    #[tokio::test]
    async fn genre_and_price_band_scenario() {
        let service = seeded_service().await;
        let mut params = ListParams::default();
        params.min_price = Some("5".to_string());
        params.max_price = Some("15".to_string());
        let plan = builder::build(&params, Some(Genre::Fiction));

        let page = service.query(&plan).await.unwrap();
        assert_eq!(page.books.len(), 1);
        assert_eq!(page.books[0].title, "A");
        assert!(page.total_count >= 1);

        let plan = builder::build(&ListParams::default(), Some(Genre::Mystery));
        let page = service.query(&plan).await.unwrap();
        assert!(page.books.iter().all(|b| b.title != "A"));
    }

    /// Store stub whose every call fails with a transport fault.
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl BookStore for UnavailableStore {
        async fn find_many(
            &self,
            _: &Filter,
            _: SortKey,
            _: Window,
        ) -> Result<Vec<Book>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn count(&self, _: &Filter) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn find_one(&self, _: &BookId) -> Result<Option<Book>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn insert_one(&self, _: Book) -> Result<BookId, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn update_one(
            &self,
            _: &BookId,
            _: &BookPatch,
        ) -> Result<UpdateResult, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn delete_one(&self, _: &BookId) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_fault_is_not_an_empty_page() {
        let service = CatalogQueryService::new(Arc::new(UnavailableStore));
        let plan = builder::build(&ListParams::default(), None);
        let err = service.query(&plan).await.unwrap_err();
        assert!(matches!(err, CatalogError::StoreUnavailable(_)));
    }
}
