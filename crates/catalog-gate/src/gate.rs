//! Mutation gate over the book collection.

use catalog_types::{
    AuditEntry, AuditOp, AuditStore, BookId, BookPatch, BookStore, CatalogError, Identity,
    NewBook, BOOK_COLLECTION, PERM_ADD_BOOK, PERM_DELETE_BOOK, PERM_UPDATE_BOOK,
};
use std::sync::Arc;

/// Three-way update signal: the identifier matched and the record changed,
/// matched but the patch was a no-op, or nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Modified,
    Unchanged,
    NotFound,
}

/// Deleting an absent identifier is a zero-effect outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Gates every catalog mutation: permission precondition, structural
/// validation, store write, audit append. All three mutation kinds are
/// audited uniformly, and only after the store confirms the write.
pub struct MutationGate {
    store: Arc<dyn BookStore>,
    audit: Arc<dyn AuditStore>,
}

impl MutationGate {
    pub fn new(store: Arc<dyn BookStore>, audit: Arc<dyn AuditStore>) -> Self {
        Self { store, audit }
    }

    /// Validate and insert a new record; returns the assigned identifier.
    pub async fn create(
        &self,
        identity: &Identity,
        new_book: NewBook,
    ) -> Result<BookId, CatalogError> {
        self.require(identity, PERM_ADD_BOOK)?;
        new_book.validate()?;
        let book = new_book.into_book(BookId::new());
        let id = self.store.insert_one(book).await?;
        tracing::info!(%id, actor = %identity.actor, "book added");
        self.append_audit(AuditOp::Add, id, identity).await;
        Ok(id)
    }

    /// Apply a partial field set. Audits only a confirmed modification.
    pub async fn update(
        &self,
        identity: &Identity,
        id: BookId,
        patch: BookPatch,
    ) -> Result<UpdateOutcome, CatalogError> {
        self.require(identity, PERM_UPDATE_BOOK)?;
        patch.validate()?;
        let result = self.store.update_one(&id, &patch).await?;
        if result.matched == 0 {
            return Ok(UpdateOutcome::NotFound);
        }
        if result.modified == 0 {
            return Ok(UpdateOutcome::Unchanged);
        }
        tracing::info!(%id, actor = %identity.actor, "book updated");
        self.append_audit(AuditOp::Update, id, identity).await;
        Ok(UpdateOutcome::Modified)
    }

    /// Remove a record. Idempotent: a missing identifier reports
    /// `NotFound` rather than failing.
    pub async fn delete(
        &self,
        identity: &Identity,
        id: BookId,
    ) -> Result<DeleteOutcome, CatalogError> {
        self.require(identity, PERM_DELETE_BOOK)?;
        let deleted = self.store.delete_one(&id).await?;
        if deleted == 0 {
            return Ok(DeleteOutcome::NotFound);
        }
        tracing::info!(%id, actor = %identity.actor, "book deleted");
        self.append_audit(AuditOp::Delete, id, identity).await;
        Ok(DeleteOutcome::Deleted)
    }

    fn require(&self, identity: &Identity, permission: &str) -> Result<(), CatalogError> {
        if identity.has_permission(permission) {
            Ok(())
        } else {
            Err(CatalogError::PermissionDenied(format!(
                "{} lacks {}",
                identity.actor, permission
            )))
        }
    }

    /// Best-effort append, strictly after the mutation is persisted. A
    /// failed audit write never unwinds the committed mutation.
    async fn append_audit(&self, operation: AuditOp, target_id: BookId, identity: &Identity) {
        let entry = AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            operation,
            collection: BOOK_COLLECTION.to_string(),
            target_id,
            actor: identity.actor.clone(),
        };
        if let Err(e) = self.audit.record(entry).await {
            tracing::warn!(%target_id, op = operation.as_str(), error = %e, "audit append failed");
        }
    }
}
