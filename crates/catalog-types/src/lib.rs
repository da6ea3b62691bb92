//! Core types and traits for the book catalog service.
//!
//! Request/response DTOs keep the field names of the legacy HTTP surface
//! (`minPrice`, `totalCount`, ...) for JSON compatibility.

mod audit;
mod book;
mod errors;
mod identity;
mod query;
mod traits;

pub use audit::*;
pub use book::*;
pub use errors::*;
pub use identity::*;
pub use query::*;
pub use traits::*;
