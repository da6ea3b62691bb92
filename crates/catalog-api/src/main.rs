//! Book catalog REST API server.
//!
//! Composition root: the store and audit handles are constructed once here
//! and injected into the query service and mutation gate.

use catalog_api::server::{self, AppState};
use catalog_gate::MutationGate;
use catalog_query::CatalogQueryService;
use catalog_store::{InMemoryAuditStore, InMemoryBookStore, JsonlAuditStore, SqliteBookStore};
use catalog_types::{AuditStore, BookStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn BookStore> = match std::env::var("CATALOG_DB") {
        Ok(path) => {
            tracing::info!(%path, "using sqlite book store");
            Arc::new(SqliteBookStore::open(&path)?)
        }
        Err(_) => {
            tracing::info!("using in-memory book store");
            Arc::new(InMemoryBookStore::new())
        }
    };
    let audit: Arc<dyn AuditStore> = match std::env::var("CATALOG_AUDIT_LOG") {
        Ok(path) => Arc::new(JsonlAuditStore::new(path)),
        Err(_) => Arc::new(InMemoryAuditStore::new()),
    };

    let state = Arc::new(AppState {
        query: CatalogQueryService::new(Arc::clone(&store)),
        gate: MutationGate::new(store, audit),
    });

    let app = server::router(state);
    let addr: SocketAddr = std::env::var("CATALOG_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:3005".to_string())
        .parse()?;
    tracing::info!("catalog API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
