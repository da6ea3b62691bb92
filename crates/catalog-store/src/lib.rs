//! Store backends for the catalog: in-memory and SQLite book stores, plus
//! in-memory and JSONL audit log sinks.

mod audit;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use audit::{InMemoryAuditStore, JsonlAuditStore};
pub use memory::InMemoryBookStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBookStore;
