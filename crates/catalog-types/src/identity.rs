//! Caller identity and permission set, supplied per request by the
//! external identity collaborator. The core only reads it.

use std::collections::BTreeSet;

pub const PERM_ADD_BOOK: &str = "book:add";
pub const PERM_UPDATE_BOOK: &str = "book:update";
pub const PERM_DELETE_BOOK: &str = "book:delete";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub actor: String,
    permissions: BTreeSet<String>,
}

impl Identity {
    pub fn new(actor: impl Into<String>, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            actor: actor.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Identity for unauthenticated callers: no permissions.
    pub fn anonymous() -> Self {
        Self::new("anonymous", std::iter::empty())
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }
}
