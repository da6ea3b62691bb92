//! Audit types: append-only record of accepted mutations.

use crate::BookId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of audited mutation. Serialized names match the legacy audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOp {
    #[serde(rename = "Add Book")]
    Add,
    #[serde(rename = "Update Book")]
    Update,
    #[serde(rename = "Delete Book")]
    Delete,
}

impl AuditOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOp::Add => "Add Book",
            AuditOp::Update => "Update Book",
            AuditOp::Delete => "Delete Book",
        }
    }
}

/// Immutable fact describing one accepted mutation. Created exactly once
/// per accepted mutation; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC3339 timestamp taken after the mutation was confirmed persisted.
    pub timestamp: String,
    pub operation: AuditOp,
    pub collection: String,
    pub target_id: BookId,
    pub actor: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("audit store error: {0}")]
    Other(String),
}

/// Append-only log of accepted mutations. No read path is exposed to core
/// components: the mutation gate only ever writes.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditStoreError>;
}
