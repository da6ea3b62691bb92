//! Integration tests: list/search pagination, get, add, update, delete,
//! auditing, and the refined error mapping.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog_api::server::{self, AppState};
use catalog_gate::MutationGate;
use catalog_query::CatalogQueryService;
use catalog_store::{InMemoryAuditStore, InMemoryBookStore};
use catalog_types::{
    AuditOp, Book, BookId, BookPatch, BookStore, Filter, SortKey, StoreError, UpdateResult,
    Window,
};
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

const ALL_PERMS: &str = "book:add,book:update,book:delete";

fn test_app() -> (axum::Router, Arc<InMemoryAuditStore>) {
    let store: Arc<dyn BookStore> = Arc::new(InMemoryBookStore::new());
    let audit = Arc::new(InMemoryAuditStore::new());
    let state = Arc::new(AppState {
        query: CatalogQueryService::new(Arc::clone(&store)),
        gate: MutationGate::new(store, audit.clone()),
    });
    (server::router(state), audit)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    perms: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(p) = perms {
        builder = builder
            .header("x-actor", "librarian")
            .header("x-permissions", p);
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn book_body(title: &str, author: &str, genre: &str, price: f64, year: i32) -> serde_json::Value {
    json!({
        "isbn": "978-0-00-000000-0",
        "title": title,
        "author": author,
        "genre": genre,
        "publication_year": year,
        "price": price,
        "description": format!("About {}", title)
    })
}

async fn add_book(app: &axum::Router, body: serde_json::Value) -> String {
    let (status, res) = send(app, "POST", "/api/books/add", Some(body), Some(ALL_PERMS)).await;
    assert_eq!(status, StatusCode::OK, "add failed: {}", res);
    res["insertedId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn add_then_query_with_price_band_and_genre() {
    let (app, _) = test_app();
    add_book(&app, book_body("A", "Adams", "Fiction", 10.00, 2000)).await;

    let (status, res) = send(
        &app,
        "GET",
        "/api/books/list?minPrice=5&maxPrice=15&genre=Fiction",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let books = res["books"].as_array().unwrap();
    assert!(books.iter().any(|b| b["title"] == "A"));
    assert!(res["totalCount"].as_u64().unwrap() >= 1);
    assert!(books
        .iter()
        .all(|b| (5.0..=15.0).contains(&b["price"].as_f64().unwrap())));

    let (status, res) = send(&app, "GET", "/api/books/list?genre=Mystery", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res["books"].as_array().unwrap().iter().all(|b| b["title"] != "A"));
}

#[tokio::test]
async fn second_page_of_size_one_is_second_in_sort_order() {
    let (app, _) = test_app();
    add_book(&app, book_body("Zebra", "Young", "Fiction", 5.0, 2001)).await;
    add_book(&app, book_body("Apple", "Abbot", "Fiction", 6.0, 2002)).await;

    let (status, res) = send(
        &app,
        "GET",
        "/api/books/list?pageNumber=2&pageSize=1",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let books = res["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    // Default sort is by author ascending; the second page holds "Young".
    assert_eq!(books[0]["author"], "Young");
    assert_eq!(res["totalCount"], json!(2));
}

#[tokio::test]
async fn pages_concatenate_without_gaps_or_duplicates() {
    let (app, _) = test_app();
    for (title, author, price) in [
        ("A", "A1", 3.0),
        ("B", "B1", 1.0),
        ("C", "C1", 2.0),
        ("D", "D1", 5.0),
        ("E", "E1", 4.0),
    ] {
        add_book(&app, book_body(title, author, "Fiction", price, 2000)).await;
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let uri = format!("/api/books/list?sortBy=price&pageSize=2&pageNumber={}", page);
        let (status, res) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let books = res["books"].as_array().unwrap();
        assert!(books.len() <= 2);
        for b in books {
            seen.push(b["price"].as_f64().unwrap());
        }
    }
    assert_eq!(seen, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[tokio::test]
async fn sort_by_price_yields_non_decreasing_prices() {
    let (app, _) = test_app();
    for (title, price) in [("A", 9.0), ("B", 3.0), ("C", 6.0)] {
        add_book(&app, book_body(title, "Same Author", "Fiction", price, 2000)).await;
    }
    let (_, res) = send(&app, "GET", "/api/books/list?sortBy=price", None, None).await;
    let prices: Vec<f64> = res["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["price"].as_f64().unwrap())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn malformed_page_parameters_fall_back_to_defaults() {
    let (app, _) = test_app();
    add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    let (status, res) = send(
        &app,
        "GET",
        "/api/books/list?pageNumber=abc&pageSize=-5&minPrice=cheap",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn extreme_page_number_degrades_to_an_empty_page() {
    let (app, _) = test_app();
    add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    let uri = format!("/api/books/list?pageNumber={}&pageSize=100", u64::MAX);
    let (status, res) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res["books"].as_array().unwrap().is_empty());
    assert_eq!(res["totalCount"], json!(1));
}

#[tokio::test]
async fn unknown_genre_is_a_validation_error() {
    let (app, _) = test_app();
    let (status, res) = send(&app, "GET", "/api/books/list?genre=Western", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["error"].as_str().unwrap().contains("genre"));
}

#[tokio::test]
async fn get_by_id_and_not_found() {
    let (app, _) = test_app();
    let id = add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    let (status, res) = send(&app, "GET", &format!("/api/books/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["title"], "A");
    assert_eq!(res["id"].as_str().unwrap(), id);

    let absent = "00000000-0000-4000-8000-000000000000";
    let (status, res) = send(&app, "GET", &format!("/api/books/{}", absent), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["message"], format!("Book {} not found", absent));
}

#[tokio::test]
async fn malformed_identifier_is_rejected_before_the_store() {
    let (app, _) = test_app();
    let (status, _) = send(&app, "GET", "/api/books/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/books/delete/not-a-uuid",
        None,
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_update_changes_only_supplied_fields() {
    let (app, _) = test_app();
    let id = add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    // Price arrives as text and is coerced before persistence.
    let (status, res) = send(
        &app,
        "PUT",
        &format!("/api/books/update/{}", id),
        Some(json!({"price": "12.50"})),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], format!("Book {} updated", id));

    let (_, book) = send(&app, "GET", &format!("/api/books/{}", id), None, None).await;
    assert_eq!(book["price"], json!(12.5));
    assert_eq!(book["title"], "A");
    assert_eq!(book["author"], "Adams");
    assert_eq!(book["genre"], "Fiction");
    assert_eq!(book["publication_year"], json!(2000));
}

#[tokio::test]
async fn update_of_missing_book_reports_not_updated() {
    let (app, _) = test_app();
    let absent = "00000000-0000-4000-8000-000000000000";
    let (status, res) = send(
        &app,
        "PUT",
        &format!("/api/books/update/{}", absent),
        Some(json!({"price": 1.0})),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["message"], format!("Book {} not updated", absent));
}

#[tokio::test]
async fn successful_update_appends_exactly_one_audit_entry() {
    let (app, audit) = test_app();
    let id = add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;
    let start = chrono::Utc::now();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/books/update/{}", id),
        Some(json!({"price": 11.0})),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updates: Vec<_> = audit
        .entries()
        .await
        .into_iter()
        .filter(|e| e.operation == AuditOp::Update)
        .collect();
    assert_eq!(updates.len(), 1);
    let entry = &updates[0];
    assert_eq!(entry.target_id.to_string(), id);
    assert_eq!(entry.collection, "Book");
    assert_eq!(entry.actor, "librarian");
    assert_eq!(
        serde_json::to_value(entry.operation).unwrap(),
        json!("Update Book")
    );
    let ts = chrono::DateTime::parse_from_rfc3339(&entry.timestamp).unwrap();
    assert!(ts >= start);
}

#[tokio::test]
async fn unchanged_update_does_not_audit() {
    let (app, audit) = test_app();
    let id = add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/books/update/{}", id),
        Some(json!({"price": 10.0})),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(audit
        .entries()
        .await
        .iter()
        .all(|e| e.operation != AuditOp::Update));
}

#[tokio::test]
async fn delete_then_get_is_absent_and_redelete_is_zero_effect() {
    let (app, audit) = test_app();
    let id = add_book(&app, book_body("A", "Adams", "Fiction", 10.0, 2000)).await;

    let (status, res) = send(
        &app,
        "DELETE",
        &format!("/api/books/delete/{}", id),
        None,
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], format!("Book {} deleted", id));

    let (status, _) = send(&app, "GET", &format!("/api/books/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, res) = send(
        &app,
        "DELETE",
        &format!("/api/books/delete/{}", id),
        None,
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["message"], format!("Book {} not deleted", id));

    let deletes: Vec<_> = audit
        .entries()
        .await
        .into_iter()
        .filter(|e| e.operation == AuditOp::Delete)
        .collect();
    assert_eq!(deletes.len(), 1);
}

#[tokio::test]
async fn mutations_without_permission_are_forbidden() {
    let (app, audit) = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/books/add",
        Some(book_body("A", "Adams", "Fiction", 10.0, 2000)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(audit.entries().await.is_empty());

    // Holding only the add permission does not grant delete.
    let id = add_book(&app, book_body("B", "Brown", "Fiction", 8.0, 2001)).await;
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/books/delete/{}", id),
        None,
        Some("book:add"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_new_book_is_rejected() {
    let (app, _) = test_app();
    let (status, res) = send(
        &app,
        "POST",
        "/api/books/add",
        Some(book_body("A", "Adams", "Fiction", -2.0, 2000)),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["error"].as_str().unwrap().contains("price"));

    let (_, res) = send(&app, "GET", "/api/books/list", None, None).await;
    assert_eq!(res["totalCount"], json!(0));
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
    async fn update_one(&self, _: &BookId, _: &BookPatch) -> Result<UpdateResult, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn delete_one(&self, _: &BookId) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn faulting_app() -> axum::Router {
    let store: Arc<dyn BookStore> = Arc::new(UnavailableStore);
    let audit = Arc::new(InMemoryAuditStore::new());
    let state = Arc::new(AppState {
        query: CatalogQueryService::new(Arc::clone(&store)),
        gate: MutationGate::new(store, audit),
    });
    server::router(state)
}

#[tokio::test]
async fn unreachable_store_surfaces_as_503_not_an_empty_page() {
    let app = faulting_app();

    let (status, res) = send(&app, "GET", "/api/books/list", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(res["error"].as_str().unwrap().contains("store unavailable"));
    assert!(res.get("books").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/books/add",
        Some(book_body("A", "Adams", "Fiction", 10.0, 2000)),
        Some(ALL_PERMS),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}
