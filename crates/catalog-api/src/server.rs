//! Axum server and routes.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use catalog_gate::{DeleteOutcome, MutationGate, UpdateOutcome};
use catalog_query::{builder, CatalogQueryService};
use catalog_types::{
    Book, BookId, BookPatch, CatalogError, Genre, Identity, ListParams, NewBook, Page,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub query: CatalogQueryService,
    pub gate: MutationGate,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/books/list", get(handle_list))
        .route("/api/books/add", post(handle_add))
        .route("/api/books/update/:id", put(handle_update))
        .route("/api/books/delete/:id", delete(handle_delete))
        .route("/api/books/:id", get(handle_get))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Refines the legacy blanket-500 mapping onto the error taxonomy.
struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::Validation(_) | CatalogError::InvalidIdentifier(_) => {
                StatusCode::BAD_REQUEST
            }
            CatalogError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CatalogError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::debug!(error = %self.0, status = %status, "request failed");
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct AddResponse {
    message: String,
    #[serde(rename = "insertedId")]
    inserted_id: BookId,
}

/// Stand-in for the external identity provider: the actor and its granted
/// permission set arrive as request headers.
fn identity_from_headers(headers: &HeaderMap) -> Identity {
    let actor = headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    let permissions = headers
        .get("x-permissions")
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Identity::new(actor, permissions)
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page>, ApiError> {
    tracing::debug!("listing books");
    let genre = match params.genre.as_deref() {
        Some(raw) => Some(Genre::parse(raw).ok_or_else(|| {
            CatalogError::Validation(format!("unknown genre: {}", raw))
        })?),
        None => None,
    };
    let plan = builder::build(&params, genre);
    let page = state.query.query(&plan).await?;
    Ok(Json(page))
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let book_id = BookId::parse(&id)?;
    match state.query.find_by_id(&book_id).await? {
        Some(book) => Ok(Json::<Book>(book).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: format!("Book {} not found", id),
            }),
        )
            .into_response()),
    }
}

async fn handle_add(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new_book): Json<NewBook>,
) -> Result<Json<AddResponse>, ApiError> {
    let identity = identity_from_headers(&headers);
    let title = new_book.title.clone();
    let id = state.gate.create(&identity, new_book).await?;
    Ok(Json(AddResponse {
        message: format!("Book {} added with an id of {}", title, id),
        inserted_id: id,
    }))
}

async fn handle_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<BookPatch>,
) -> Result<Response, ApiError> {
    let identity = identity_from_headers(&headers);
    let book_id = BookId::parse(&id)?;
    match state.gate.update(&identity, book_id, patch).await? {
        UpdateOutcome::Modified => Ok(Json(MessageResponse {
            message: format!("Book {} updated", id),
        })
        .into_response()),
        UpdateOutcome::Unchanged | UpdateOutcome::NotFound => Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: format!("Book {} not updated", id),
            }),
        )
            .into_response()),
    }
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let identity = identity_from_headers(&headers);
    let book_id = BookId::parse(&id)?;
    match state.gate.delete(&identity, book_id).await? {
        DeleteOutcome::Deleted => Ok(Json(MessageResponse {
            message: format!("Book {} deleted", id),
        })
        .into_response()),
        DeleteOutcome::NotFound => Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: format!("Book {} not deleted", id),
            }),
        )
            .into_response()),
    }
}

async fn handle_health() -> &'static str {
    "ok"
}
